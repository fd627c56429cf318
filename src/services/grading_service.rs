use crate::models::question::Question;
use std::collections::HashMap;
use uuid::Uuid;

pub struct GradingService;

impl GradingService {
    /// Deterministic exam grading at submit time: one point per question
    /// whose selected option equals the stored correct answer. Unanswered
    /// questions contribute zero.
    pub fn grade(questions: &[Question], answers: &HashMap<Uuid, String>) -> i32 {
        questions
            .iter()
            .filter(|q| {
                answers
                    .get(&q.id)
                    .map(|selected| *selected == q.correct_answer)
                    .unwrap_or(false)
            })
            .count() as i32
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn question(correct: &str) -> Question {
        Question {
            id: Uuid::new_v4(),
            exam_id: Uuid::new_v4(),
            question: "Which option?".to_string(),
            options: json!(["A", "B", "C", "D"]),
            correct_answer: correct.to_string(),
        }
    }

    #[test]
    fn score_is_count_of_exact_matches() {
        let questions: Vec<Question> = vec![question("A"), question("B"), question("C")];
        let mut answers = HashMap::new();
        answers.insert(questions[0].id, "A".to_string());
        answers.insert(questions[1].id, "D".to_string());
        answers.insert(questions[2].id, "C".to_string());
        assert_eq!(GradingService::grade(&questions, &answers), 2);
    }

    #[test]
    fn unanswered_questions_score_zero() {
        // 10 questions, 8 answered, 2 of those correct.
        let questions: Vec<Question> = (0..10).map(|_| question("A")).collect();
        let mut answers = HashMap::new();
        for (i, q) in questions.iter().take(8).enumerate() {
            let selected = if i < 2 { "A" } else { "B" };
            answers.insert(q.id, selected.to_string());
        }
        assert_eq!(GradingService::grade(&questions, &answers), 2);
    }

    #[test]
    fn empty_answer_map_scores_zero() {
        let questions = vec![question("A"), question("B")];
        assert_eq!(GradingService::grade(&questions, &HashMap::new()), 0);
    }

    #[test]
    fn answers_for_unknown_questions_are_ignored() {
        let questions = vec![question("A")];
        let mut answers = HashMap::new();
        answers.insert(Uuid::new_v4(), "A".to_string());
        assert_eq!(GradingService::grade(&questions, &answers), 0);
    }
}
