//! Academic tutor evaluations of an internship.

use crate::model::validation::{require, require_range, ValidationError};
use crate::model::RecordId;
use crate::store::{Record, TableName};
use serde::{Deserialize, Serialize};

pub const MIN_OVERALL_SCORE: f64 = 0.5;
pub const MAX_OVERALL_SCORE: f64 = 5.0;
pub const MIN_ASPECT_SCORE: u8 = 1;
pub const MAX_ASPECT_SCORE: u8 = 5;

/// Five sub-scores, each 1..=5.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvaluationAspects {
    #[serde(rename = "puntualidad")]
    pub punctuality: u8,
    #[serde(rename = "responsabilidad")]
    pub responsibility: u8,
    #[serde(rename = "iniciativa")]
    pub initiative: u8,
    #[serde(rename = "conocimientos")]
    pub knowledge: u8,
    #[serde(rename = "comunicacion")]
    pub communication: u8,
}

impl EvaluationAspects {
    pub fn entries(&self) -> [(&'static str, u8); 5] {
        [
            ("puntualidad", self.punctuality),
            ("responsabilidad", self.responsibility),
            ("iniciativa", self.initiative),
            ("conocimientos", self.knowledge),
            ("comunicacion", self.communication),
        ]
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        for (field, score) in self.entries() {
            require_range(
                field,
                f64::from(score),
                f64::from(MIN_ASPECT_SCORE),
                f64::from(MAX_ASPECT_SCORE),
            )?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Evaluation {
    pub id: RecordId,
    pub practica_id: RecordId,
    pub estudiante_id: RecordId,
    pub tutor_academico_id: RecordId,
    #[serde(rename = "fecha")]
    pub created_at: String,
    /// Overall score, 0.5..=5.0 in half points.
    #[serde(rename = "calificacion")]
    pub score: f64,
    #[serde(rename = "comentarios", default)]
    pub comments: String,
    #[serde(rename = "aspectos")]
    pub aspects: EvaluationAspects,
}

impl Record for Evaluation {
    const TABLE: TableName = TableName::Evaluations;

    fn id(&self) -> &str {
        &self.id
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewEvaluation {
    pub internship_id: RecordId,
    pub score: f64,
    pub comments: String,
    pub aspects: EvaluationAspects,
}

impl NewEvaluation {
    pub fn validate(&self) -> Result<(), ValidationError> {
        require("practicaId", &self.internship_id)?;
        require_range("calificacion", self.score, MIN_OVERALL_SCORE, MAX_OVERALL_SCORE)?;
        if (self.score * 2.0).fract() != 0.0 {
            return Err(ValidationError::InvalidFormat {
                field: "calificacion",
                value: self.score.to_string(),
            });
        }
        self.aspects.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::{EvaluationAspects, NewEvaluation};
    use crate::model::validation::ValidationError;

    fn request(score: f64, punctuality: u8) -> NewEvaluation {
        NewEvaluation {
            internship_id: "p1".to_string(),
            score,
            comments: String::new(),
            aspects: EvaluationAspects {
                punctuality,
                responsibility: 4,
                initiative: 4,
                knowledge: 5,
                communication: 3,
            },
        }
    }

    #[test]
    fn half_point_scores_are_accepted() {
        request(4.5, 5).validate().unwrap();
        request(0.5, 1).validate().unwrap();
    }

    #[test]
    fn off_grid_and_zero_scores_are_rejected() {
        assert!(matches!(
            request(4.2, 5).validate(),
            Err(ValidationError::InvalidFormat { field: "calificacion", .. })
        ));
        assert!(matches!(
            request(0.0, 5).validate(),
            Err(ValidationError::OutOfRange { field: "calificacion", .. })
        ));
    }

    #[test]
    fn aspects_must_be_between_one_and_five() {
        assert!(matches!(
            request(4.0, 0).validate(),
            Err(ValidationError::OutOfRange { field: "puntualidad", .. })
        ));
    }
}
