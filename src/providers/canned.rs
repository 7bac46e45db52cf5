use async_trait::async_trait;

use super::traits::{Responder, ResponderError};

const ARABIC_TIP: &str = "خذ لحظة لتهدأ وأعد صياغة ردك بطريقة بنّاءة.";
const ENGLISH_TIP: &str = "A short pause can help; try rephrasing constructively.";

/// Offline responder with fixed tips.
///
/// Answers in Arabic for `ar`, in English for `en` and with both for any
/// other or undetermined language. Also serves as the fallback whenever a
/// remote responder fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct CannedResponder;

impl CannedResponder {
    /// The tip for `language`.
    pub fn tip_for(language: &str) -> String {
        let primary = language.split(['-', '_']).next().unwrap_or_default().to_ascii_lowercase();
        match primary.as_str() {
            "ar" => ARABIC_TIP.to_string(),
            "en" => ENGLISH_TIP.to_string(),
            _ => format!("{ARABIC_TIP}\n{ENGLISH_TIP}"),
        }
    }
}

#[async_trait]
impl Responder for CannedResponder {
    async fn compose_tip(&self, _text: &str, language: &str) -> Result<String, ResponderError> {
        Ok(Self::tip_for(language))
    }
}
