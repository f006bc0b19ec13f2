use super::{Transcript, TranscriptError};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Transcript store keyed by source file stem.
///
/// Keeps an in-memory copy for the lifetime of the pipeline run and mirrors
/// every entry to `<dir>/<stem>_transcript.json` so later runs can skip
/// transcription of the same file.
pub struct TranscriptCache {
    dir: PathBuf,
    memory: HashMap<String, Transcript>,
}

impl TranscriptCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            memory: HashMap::new(),
        }
    }

    pub fn path_for(&self, source: &Path) -> PathBuf {
        self.dir.join(format!("{}_transcript.json", cache_key(source)))
    }

    /// Return the cached transcript for `source`. A corrupt or inconsistent
    /// cache file is treated as a miss.
    pub fn lookup(&mut self, source: &Path) -> Option<Transcript> {
        let key = cache_key(source);
        if let Some(hit) = self.memory.get(&key) {
            return Some(hit.clone());
        }

        let path = self.path_for(source);
        let raw = fs::read_to_string(&path).ok()?;
        let loaded = serde_json::from_str::<Transcript>(&raw)
            .map_err(TranscriptError::from)
            .and_then(Transcript::revalidated);
        match loaded {
            Ok(transcript) => {
                tracing::info!(
                    "Transcript cache hit: {} ({} segments)",
                    path.display(),
                    transcript.segments.len()
                );
                self.memory.insert(key, transcript.clone());
                Some(transcript)
            }
            Err(e) => {
                tracing::warn!("Ignoring unreadable transcript cache {}: {}", path.display(), e);
                None
            }
        }
    }

    pub fn insert(&mut self, source: &Path, transcript: Transcript) -> Result<(), TranscriptError> {
        fs::create_dir_all(&self.dir)?;
        let path = self.path_for(source);
        let json = serde_json::to_string_pretty(&transcript)?;
        fs::write(&path, json)?;
        tracing::debug!("Transcript cached at {}", path.display());
        self.memory.insert(cache_key(source), transcript);
        Ok(())
    }

    pub fn invalidate(&mut self, source: &Path) -> Result<(), TranscriptError> {
        self.memory.remove(&cache_key(source));
        let path = self.path_for(source);
        if path.exists() {
            fs::remove_file(&path)?;
        }
        Ok(())
    }
}

fn cache_key(source: &Path) -> String {
    source
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "transcript".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transcript::Segment;

    fn transcript() -> Transcript {
        Transcript::new("en", vec![Segment::new(0.0, 2.0, "Cached words.")]).unwrap()
    }

    #[test]
    fn insert_then_lookup_survives_new_instance() {
        let dir = tempfile::tempdir().unwrap();
        let source = Path::new("/videos/talk.mp4");

        let mut cache = TranscriptCache::new(dir.path());
        assert!(cache.lookup(source).is_none());
        cache.insert(source, transcript()).unwrap();
        assert!(dir.path().join("talk_transcript.json").exists());

        let mut fresh = TranscriptCache::new(dir.path());
        let hit = fresh.lookup(source).unwrap();
        assert_eq!(hit.full_text, "Cached words.");
    }

    #[test]
    fn invalidate_removes_both_copies() {
        let dir = tempfile::tempdir().unwrap();
        let source = Path::new("talk.webm");

        let mut cache = TranscriptCache::new(dir.path());
        cache.insert(source, transcript()).unwrap();
        cache.invalidate(source).unwrap();

        assert!(cache.lookup(source).is_none());
        assert!(!cache.path_for(source).exists());
    }

    #[test]
    fn out_of_order_file_is_a_miss() {
        let dir = tempfile::tempdir().unwrap();
        let source = Path::new("edited.mp4");
        let mut cache = TranscriptCache::new(dir.path());
        fs::write(
            cache.path_for(source),
            r#"{"language":"en","duration":9.0,"full_text":"b a","segments":[
                {"id":0,"start":5.0,"end":9.0,"text":"Second."},
                {"id":1,"start":0.0,"end":4.0,"text":"First."}]}"#,
        )
        .unwrap();

        assert!(cache.lookup(source).is_none());
    }

    #[test]
    fn loaded_file_is_normalized() {
        let dir = tempfile::tempdir().unwrap();
        let source = Path::new("legacy.mp4");
        let mut cache = TranscriptCache::new(dir.path());
        fs::write(
            cache.path_for(source),
            r#"{"language":"en","duration":99.0,"full_text":"","segments":[
                {"id":7,"start":0.0,"end":2.0,"text":"  Hello there. "},
                {"id":3,"start":2.5,"end":4.0,"text":"Bye."}]}"#,
        )
        .unwrap();

        let hit = cache.lookup(source).unwrap();
        assert_eq!(hit.duration, 4.0);
        assert_eq!(hit.full_text, "Hello there. Bye.");
        assert_eq!(hit.segments[0].text, "Hello there.");
        assert_eq!((hit.segments[0].id, hit.segments[1].id), (0, 1));
    }

    #[test]
    fn corrupt_file_is_a_miss() {
        let dir = tempfile::tempdir().unwrap();
        let source = Path::new("broken.mp4");
        let mut cache = TranscriptCache::new(dir.path());
        fs::write(cache.path_for(source), "{ not json").unwrap();

        assert!(cache.lookup(source).is_none());
    }
}
