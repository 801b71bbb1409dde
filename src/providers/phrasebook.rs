/*!
 * Fixed translations for short emergency phrases.
 *
 * The phrasebook sits in front of another engine. An utterance that is
 * exactly one of the known phrases is answered from the table without a
 * model call; anything else goes to the wrapped engine.
 */

use async_trait::async_trait;
use log::debug;
use std::sync::Arc;

use crate::errors::ProviderError;
use crate::language_utils::to_part1;
use crate::providers::{Translator, TranslatorOutput, TranslatorRequest};

/// Confidence of a phrasebook answer
pub const PHRASEBOOK_CONFIDENCE: f64 = 0.9;

type PhraseTable = &'static [(&'static str, &'static str)];

const PHRASES: &[(&str, PhraseTable)] = &[
    (
        "call for help",
        &[
            ("es", "¡Llame para pedir ayuda!"),
            ("fr", "Appelez à l'aide !"),
            ("de", "Rufen Sie um Hilfe!"),
            ("zh", "呼救！"),
            ("ar", "اطلب المساعدة!"),
            ("ru", "Зовите на помощь!"),
            ("pt", "Peça ajuda!"),
            ("hi", "मदद के लिए बुलाओ!"),
            ("ja", "助けを呼んでください！"),
        ],
    ),
    (
        "emergency",
        &[
            ("es", "Emergencia"),
            ("fr", "Urgence"),
            ("de", "Notfall"),
            ("zh", "紧急情况"),
            ("ar", "طوارئ"),
            ("ru", "Экстренная ситуация"),
            ("pt", "Emergência"),
            ("hi", "आपातकाल"),
            ("ja", "緊急事態"),
        ],
    ),
    (
        "pain",
        &[
            ("es", "Dolor"),
            ("fr", "Douleur"),
            ("de", "Schmerz"),
            ("zh", "疼痛"),
            ("ar", "ألم"),
            ("ru", "Боль"),
            ("pt", "Dor"),
            ("hi", "दर्द"),
            ("ja", "痛み"),
        ],
    ),
    (
        "help",
        &[
            ("es", "Ayuda"),
            ("fr", "Aide"),
            ("de", "Hilfe"),
            ("zh", "帮助"),
            ("ar", "مساعدة"),
            ("ru", "Помощь"),
            ("pt", "Ajuda"),
            ("hi", "सहायता"),
            ("ja", "助け"),
        ],
    ),
];

/// Exact (case-insensitive, trailing punctuation ignored) phrase lookup
pub fn lookup(text: &str, target_language: &str) -> Option<&'static str> {
    let key = text
        .trim()
        .trim_end_matches(['!', '.', '?'])
        .trim()
        .to_lowercase();
    let target = to_part1(target_language)?;
    PHRASES
        .iter()
        .find(|(phrase, _)| *phrase == key)
        .and_then(|(_, table)| table.iter().find(|(lang, _)| *lang == target))
        .map(|(_, translation)| *translation)
}

#[derive(Debug, Clone)]
pub struct PhrasebookTranslator {
    inner: Arc<dyn Translator>,
    name: String,
}

impl PhrasebookTranslator {
    pub fn new(inner: Arc<dyn Translator>) -> Self {
        let name = format!("phrasebook+{}", inner.name());
        Self { inner, name }
    }
}

#[async_trait]
impl Translator for PhrasebookTranslator {
    async fn translate(&self, request: &TranslatorRequest) -> Result<TranslatorOutput, ProviderError> {
        if let Some(translation) = lookup(&request.text, &request.target_language) {
            debug!("Answered from emergency phrasebook");
            return Ok(TranslatorOutput {
                translated_text: translation.to_string(),
                confidence: PHRASEBOOK_CONFIDENCE,
            });
        }
        self.inner.translate(request).await
    }

    fn name(&self) -> &str {
        &self.name
    }

    async fn test_connection(&self) -> Result<(), ProviderError> {
        self.inner.test_connection().await
    }
}
