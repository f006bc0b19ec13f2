// analysis/prompt.rs — Viral-potential scoring prompt, one template per language

use super::lexicon::Language;
use super::types::truncate_chars;

/// Roughly 3000 tokens of transcript
const MAX_TRANSCRIPT_CHARS: usize = 12_000;

const EN_TEMPLATE: &str = "Analyze this transcript segment for viral potential on short-form video platforms.
Rate each criterion from 0 to 10:
- Humor: how funny it is
- Emotion: how strongly it moves the viewer
- Surprise: how unexpected or surprising it is
- Quotability: how likely people are to repeat or share a line from it

Then give an overall score from 0 to 10 and a one-sentence reason.

Transcript:
\"{{transcript}}\"

Answer using exactly this format:
Humor: [0-10]
Emotion: [0-10]
Surprise: [0-10]
Quotability: [0-10]
Overall Score: [0-10]
Reason: [one sentence]
";

const FR_TEMPLATE: &str = "Analyse ce passage de transcription pour son potentiel viral sur les plateformes de vidéos courtes.
Note chaque critère de 0 à 10 :
- Humour : à quel point c'est drôle
- Émotion : à quel point cela touche le spectateur
- Surprise : à quel point c'est inattendu
- Citabilité : à quel point une phrase sera reprise ou partagée

Donne ensuite un score global de 0 à 10 et une raison en une phrase.

Transcription :
\"{{transcript}}\"

Réponds exactement dans ce format :
Humour: [0-10]
Émotion: [0-10]
Surprise: [0-10]
Citabilité: [0-10]
Score global: [0-10]
Raison: [une phrase]
";

/// Render the scoring prompt for one chunk of transcript
pub fn build_prompt(transcript: &str, language: Language) -> String {
    let template = match language {
        Language::English => EN_TEMPLATE,
        Language::French => FR_TEMPLATE,
    };
    let text = truncate_chars(transcript.trim(), MAX_TRANSCRIPT_CHARS, "...[TRUNCATED]");
    template.replace("{{transcript}}", &text)
}

/// Rationale used when the backend could not be reached
pub fn uncertain_reason(language: Language) -> &'static str {
    match language {
        Language::English => "Analysis uncertain",
        Language::French => "Analyse incertaine",
    }
}

/// Rationale used when the response carried no reason line
pub fn missing_reason(language: Language) -> &'static str {
    match language {
        Language::English => "No specific reason provided",
        Language::French => "Aucune raison précise fournie",
    }
}

/// Rationale attached to fallback selections
pub fn fallback_reason(language: Language) -> &'static str {
    match language {
        Language::English => "Selected as top content",
        Language::French => "Sélectionné comme meilleur contenu",
    }
}
