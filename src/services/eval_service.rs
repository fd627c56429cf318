use crate::error::Result;
use reqwest::Client;
use serde_json::{json, Value as JsonValue};

const CHAT_COMPLETIONS_URL: &str = "https://router.huggingface.co/v1/chat/completions";

/// Interview evaluation client. Called exactly once per attempt, at submit
/// time; the rubric score and structured feedback it returns are persisted
/// and never recomputed.
#[derive(Clone)]
pub struct EvalService {
    client: Client,
    api_key: String,
    model: String,
}

#[derive(Debug, Clone)]
pub struct Evaluation {
    pub score: i32,
    pub feedback: JsonValue,
}

impl EvalService {
    pub fn new(api_key: String, model: String, client: Client) -> Self {
        Self {
            client,
            api_key,
            model,
        }
    }

    pub async fn evaluate(&self, conversation_history: &JsonValue) -> Result<Evaluation> {
        let mut messages: Vec<JsonValue> = conversation_history
            .as_array()
            .cloned()
            .unwrap_or_default();
        messages.push(json!({
            "role": "user",
            "content": "INTERVIEW_END. Please provide a final evaluation in JSON format only: \
                { \"score\": number(0-100), \"feedback\": \"summary text\", \
                  \"strengths\": [\"list\"], \"weaknesses\": [\"list\"] }"
        }));

        let payload = json!({
            "model": self.model,
            "messages": messages,
            "max_tokens": 1000,
            "temperature": 0.5,
        });

        let resp: JsonValue = self
            .client
            .post(CHAT_COMPLETIONS_URL)
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .await?
            .json()
            .await?;

        let content = resp["choices"][0]["message"]["content"]
            .as_str()
            .unwrap_or_default();

        Ok(Self::parse_evaluation(content))
    }

    /// Extracts the evaluation object from a model reply, tolerating prose
    /// around the JSON. Falls back to score 0 with the raw text as feedback.
    fn parse_evaluation(content: &str) -> Evaluation {
        let extracted = content
            .find('{')
            .zip(content.rfind('}'))
            .and_then(|(start, end)| {
                serde_json::from_str::<JsonValue>(&content[start..=end]).ok()
            });

        match extracted {
            Some(value) => {
                let score = value
                    .get("score")
                    .and_then(|v| v.as_i64())
                    .unwrap_or(0)
                    .clamp(0, 100) as i32;
                Evaluation {
                    score,
                    feedback: value,
                }
            }
            None => Evaluation {
                score: 0,
                feedback: json!({
                    "score": 0,
                    "feedback": content,
                    "strengths": [],
                    "weaknesses": [],
                }),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_clean_json_reply() {
        let eval = EvalService::parse_evaluation(
            r#"{"score": 85, "feedback": "Solid answers", "strengths": ["depth"], "weaknesses": []}"#,
        );
        assert_eq!(eval.score, 85);
        assert_eq!(eval.feedback["feedback"], "Solid answers");
    }

    #[test]
    fn parses_json_wrapped_in_prose() {
        let eval = EvalService::parse_evaluation(
            "Here is the evaluation:\n{\"score\": 40, \"feedback\": \"Needs work\"}\nGood luck!",
        );
        assert_eq!(eval.score, 40);
    }

    #[test]
    fn clamps_out_of_range_scores() {
        assert_eq!(EvalService::parse_evaluation(r#"{"score": 150}"#).score, 100);
        assert_eq!(EvalService::parse_evaluation(r#"{"score": -5}"#).score, 0);
    }

    #[test]
    fn falls_back_on_unparseable_reply() {
        let eval = EvalService::parse_evaluation("The candidate did fine.");
        assert_eq!(eval.score, 0);
        assert_eq!(eval.feedback["feedback"], "The candidate did fine.");
    }
}
