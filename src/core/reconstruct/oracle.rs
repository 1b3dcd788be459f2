use std::time::Duration;

use log::{debug, warn};
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};

/// 外部纠错服务的窄接口
///
/// 提交字母序列和相邻单词上下文，换回一个最佳猜测单词。
/// 超时或出错一律视为"没有答案"，绝不让调用方失败。
pub trait Oracle: Send + Sync {
    fn suggest(&self, letters: &str, context: &str) -> Option<String>;

    /// Name used in log lines.
    fn name(&self) -> &str;
}

#[derive(Serialize)]
struct SuggestRequest<'a> {
    letters: &'a str,
    context: &'a str,
}

#[derive(Deserialize)]
struct SuggestResponse {
    #[serde(default)]
    result: Option<String>,
}

/// HTTP adapter: POST `{letters, context}`, read `{result}` back.
pub struct HttpOracle {
    client: Client,
    endpoint: String,
    name: String,
}

impl HttpOracle {
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);

    pub fn new(name: impl Into<String>, endpoint: impl Into<String>) -> Self {
        Self::with_timeout(name, endpoint, Self::DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(
        name: impl Into<String>,
        endpoint: impl Into<String>,
        timeout: Duration,
    ) -> Self {
        let client = Client::builder().timeout(timeout).build().unwrap();
        Self {
            client,
            endpoint: endpoint.into(),
            name: name.into(),
        }
    }
}

impl Oracle for HttpOracle {
    fn suggest(&self, letters: &str, context: &str) -> Option<String> {
        let request = SuggestRequest { letters, context };

        let response = match self.client.post(&self.endpoint).json(&request).send() {
            Ok(response) => response,
            Err(err) => {
                warn!("{}: request failed: {}", self.name, err);
                return None;
            }
        };

        if !response.status().is_success() {
            warn!("{}: status {}", self.name, response.status());
            return None;
        }

        let body: SuggestResponse = match response.json() {
            Ok(body) => body,
            Err(err) => {
                warn!("{}: invalid response body: {}", self.name, err);
                return None;
            }
        };

        let word = body.result?.trim().to_string();
        if word.is_empty() {
            None
        } else {
            Some(word)
        }
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Scripted oracle for tests and offline runs.
pub struct MockOracle {
    name: String,
    reply: Option<Box<dyn Fn(&str, &str) -> Option<String> + Send + Sync>>,
}

impl MockOracle {
    /// Never answers.
    pub fn silent(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            reply: None,
        }
    }

    /// Answers the same word for every query.
    pub fn with_fixed(name: impl Into<String>, word: impl Into<String>) -> Self {
        let word = word.into();
        Self::with_reply(name, move |_, _| Some(word.clone()))
    }

    pub fn with_reply<F>(name: impl Into<String>, reply: F) -> Self
    where
        F: Fn(&str, &str) -> Option<String> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            reply: Some(Box::new(reply)),
        }
    }
}

impl Oracle for MockOracle {
    fn suggest(&self, letters: &str, context: &str) -> Option<String> {
        self.reply.as_ref().and_then(|reply| reply(letters, context))
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// 双服务仲裁
///
/// Agreement (case-insensitive) wins outright. On disagreement the
/// first oracle's answer takes precedence, then the second's, then the
/// raw string. A word always comes back.
pub struct OracleCorrector {
    primary: Box<dyn Oracle>,
    secondary: Option<Box<dyn Oracle>>,
}

impl OracleCorrector {
    pub fn new(primary: Box<dyn Oracle>) -> Self {
        Self {
            primary,
            secondary: None,
        }
    }

    pub fn with_secondary(primary: Box<dyn Oracle>, secondary: Box<dyn Oracle>) -> Self {
        Self {
            primary,
            secondary: Some(secondary),
        }
    }

    pub fn correct(&self, raw: &str, context: &str) -> String {
        let first = self.primary.suggest(raw, context);
        let second = self
            .secondary
            .as_ref()
            .and_then(|oracle| oracle.suggest(raw, context));

        match (first, second) {
            (Some(a), Some(b)) => {
                if !a.eq_ignore_ascii_case(&b) {
                    debug!(
                        "oracles disagree on {:?}: {} says {:?}, {:?} loses",
                        raw,
                        self.primary.name(),
                        a,
                        b
                    );
                }
                a
            }
            (Some(a), None) => a,
            (None, Some(b)) => b,
            (None, None) => raw.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_agreement_accepted() {
        let corrector = OracleCorrector::with_secondary(
            Box::new(MockOracle::with_fixed("first", "cat")),
            Box::new(MockOracle::with_fixed("second", "CAT")),
        );
        // agreement is case-insensitive, first oracle's casing wins
        assert_eq!(corrector.correct("cqt", ""), "cat");
    }

    #[test]
    fn test_disagreement_prefers_first() {
        let corrector = OracleCorrector::with_secondary(
            Box::new(MockOracle::with_fixed("first", "cot")),
            Box::new(MockOracle::with_fixed("second", "cat")),
        );
        assert_eq!(corrector.correct("cqt", ""), "cot");
    }

    #[test]
    fn test_silent_first_falls_to_second() {
        let corrector = OracleCorrector::with_secondary(
            Box::new(MockOracle::silent("first")),
            Box::new(MockOracle::with_fixed("second", "cat")),
        );
        assert_eq!(corrector.correct("cqt", ""), "cat");
    }

    #[test]
    fn test_both_silent_falls_to_raw() {
        let corrector = OracleCorrector::with_secondary(
            Box::new(MockOracle::silent("first")),
            Box::new(MockOracle::silent("second")),
        );
        assert_eq!(corrector.correct("cqt", ""), "cqt");
    }

    #[test]
    fn test_single_oracle() {
        let corrector = OracleCorrector::new(Box::new(MockOracle::with_fixed("only", "hello")));
        assert_eq!(corrector.correct("helo", "prev next"), "hello");

        let silent = OracleCorrector::new(Box::new(MockOracle::silent("only")));
        assert_eq!(silent.correct("helo", ""), "helo");
    }

    #[test]
    fn test_context_reaches_oracle() {
        let corrector = OracleCorrector::new(Box::new(MockOracle::with_reply(
            "echo",
            |letters, context| Some(format!("{}:{}", letters, context)),
        )));
        assert_eq!(corrector.correct("hi", "hello there"), "hi:hello there");
    }
}
