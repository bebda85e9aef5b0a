//! Scenario configuration.
//!
//! A scenario is a JSON document naming the tutors and students to run, the
//! participant settings and the simulation timing. Every field has a default,
//! so `{}` is the built-in three-tutor, five-student scenario.

use std::collections::BTreeSet;
use std::path::Path;
use std::time::Duration;

use scholar_proto::{Clock, Endpoints, Identity, Topic};
use scholar_resource::ResourceConfig;
use scholar_student::StudentConfig;
use scholar_tutor::TutorConfig;
use serde::{Deserialize, Serialize};

use crate::error::{Result, SimError};

/// A tutor to start.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TutorSpec {
    /// Endpoint name.
    pub name: Identity,
    /// Topics taught.
    pub expertise: Vec<Topic>,
}

/// A student to start.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudentSpec {
    /// Endpoint name.
    pub name: Identity,
    /// Topic to learn.
    pub topic: Topic,
    /// Initial knowledge in `[0, 1]`.
    pub knowledge: f64,
}

/// Random availability changes pushed to tutors.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnvironmentConfig {
    /// Whether the environment runs at all.
    pub enabled: bool,
    /// Units between perturbations.
    pub period: f64,
}

impl Default for EnvironmentConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            period: 30.0,
        }
    }
}

/// A complete run description.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScenarioConfig {
    /// Wall-clock length of one time unit, in milliseconds.
    pub time_unit_ms: u64,
    /// Units to wait after starting services before starting students.
    pub warmup: f64,
    /// Units after which unfinished students are stopped.
    pub run_deadline: f64,
    /// Service identities.
    pub endpoints: Endpoints,
    /// Tutors to start.
    pub tutors: Vec<TutorSpec>,
    /// Students to start.
    pub students: Vec<StudentSpec>,
    /// Settings shared by every tutor.
    pub tutor: TutorConfig,
    /// Settings shared by every student.
    pub student: StudentConfig,
    /// Resource manager settings.
    pub resource: ResourceConfig,
    /// Availability perturbations.
    pub environment: EnvironmentConfig,
}

impl Default for ScenarioConfig {
    fn default() -> Self {
        let tutor = |name: &str, expertise: &[&str]| TutorSpec {
            name: Identity::new(name),
            expertise: expertise.iter().map(ToString::to_string).collect(),
        };
        let student = |name: &str, topic: &str, knowledge: f64| StudentSpec {
            name: Identity::new(name),
            topic: topic.to_string(),
            knowledge,
        };
        Self {
            time_unit_ms: 1000,
            warmup: 5.0,
            run_deadline: 600.0,
            endpoints: Endpoints::default(),
            tutors: vec![
                tutor("tutor1", &["mathematics", "physics"]),
                tutor("tutor2", &["physics"]),
                tutor("tutor3", &["biology", "history"]),
            ],
            students: vec![
                student("student1", "biology", 0.1),
                student("student2", "mathematics", 0.3),
                student("student3", "history", 0.2),
                student("student4", "mathematics", 0.4),
                student("student5", "physics", 0.1),
            ],
            tutor: TutorConfig::default(),
            student: StudentConfig::default(),
            resource: ResourceConfig::default(),
            environment: EnvironmentConfig::default(),
        }
    }
}

impl ScenarioConfig {
    /// Loads and validates a scenario file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed or validated.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| SimError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&content)
    }

    /// Parses and validates a scenario.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is invalid or the scenario inconsistent.
    pub fn from_json(content: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Pretty JSON form, as written by `scholar init-config`.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Writes the scenario to `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the write fails.
    pub fn write(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        std::fs::write(path, self.to_json_pretty()?).map_err(|source| SimError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Clock for this scenario's time unit.
    #[must_use]
    pub fn clock(&self) -> Clock {
        Clock::new(Duration::from_millis(self.time_unit_ms))
    }

    /// Checks the scenario for problems that would break a run.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::Config`] for empty or duplicate names, knowledge
    /// outside `[0, 1]`, a zero time unit, bad timings, a goal no student
    /// can reach, tutor quotes that would fail validation, or invalid
    /// participant settings.
    pub fn validate(&self) -> Result<()> {
        if self.time_unit_ms == 0 {
            return Err(SimError::Config("time_unit_ms must be positive".into()));
        }
        if !(self.run_deadline.is_finite() && self.run_deadline > 0.0) {
            return Err(SimError::Config("run_deadline must be positive".into()));
        }
        if !(self.warmup.is_finite() && self.warmup >= 0.0) {
            return Err(SimError::Config("warmup must be non-negative".into()));
        }
        if self.environment.enabled && !(self.environment.period.is_finite() && self.environment.period > 0.0) {
            return Err(SimError::Config("environment period must be positive".into()));
        }
        if self.students.is_empty() {
            return Err(SimError::Config("scenario has no students".into()));
        }

        let mut seen: BTreeSet<&Identity> = BTreeSet::new();
        let names = self
            .endpoints
            .all()
            .into_iter()
            .chain(self.tutors.iter().map(|t| &t.name))
            .chain(self.students.iter().map(|s| &s.name));
        for name in names {
            if name.is_empty() {
                return Err(SimError::Config("participant names must not be empty".into()));
            }
            if !seen.insert(name) {
                return Err(SimError::Config(format!("duplicate participant name: {name}")));
            }
        }

        for tutor in &self.tutors {
            if tutor.expertise.is_empty() {
                return Err(SimError::Config(format!("tutor {} teaches nothing", tutor.name)));
            }
        }
        for student in &self.students {
            if !(0.0..=1.0).contains(&student.knowledge) {
                return Err(SimError::Config(format!(
                    "student {} knowledge {} is outside [0, 1]",
                    student.name, student.knowledge
                )));
            }
            if student.topic.trim().is_empty() {
                return Err(SimError::Config(format!("student {} has no topic", student.name)));
            }
        }

        let goal = self.student.goal;
        if !(goal > 0.0 && goal <= 1.0) {
            return Err(SimError::Config(format!(
                "student goal {goal} is outside (0, 1]"
            )));
        }
        if !(0.0..=1.0).contains(&self.student.resource_gain) {
            return Err(SimError::Config(format!(
                "student resource_gain {} is outside [0, 1]",
                self.student.resource_gain
            )));
        }
        for (name, level) in [
            ("available_expertise", self.tutor.available_expertise),
            ("busy_expertise", self.tutor.busy_expertise),
        ] {
            if !(0.0..=1.0).contains(&level) {
                return Err(SimError::Config(format!(
                    "tutor {name} {level} is outside [0, 1]"
                )));
            }
        }
        for (name, wait) in [
            ("wait_base", self.tutor.wait_base),
            ("wait_per_queued", self.tutor.wait_per_queued),
        ] {
            if !(wait.is_finite() && wait >= 0.0) {
                return Err(SimError::Config(format!(
                    "tutor {name} must be non-negative, got {wait}"
                )));
            }
        }

        self.tutor
            .session_duration
            .validate()
            .map_err(|e| SimError::Config(format!("tutor session_duration: {e}")))?;
        self.resource.validate()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test]
    fn default_is_the_classroom_scenario() {
        let config = ScenarioConfig::default();
        assert_eq!(config.tutors.len(), 3);
        assert_eq!(config.students.len(), 5);
        assert_eq!(config.students[0].topic, "biology");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn empty_document_uses_defaults() {
        let config = ScenarioConfig::from_json("{}").unwrap();
        assert_eq!(config, ScenarioConfig::default());
    }

    #[test]
    fn file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scenario.json");

        let mut config = ScenarioConfig::default();
        config.time_unit_ms = 10;
        config.environment.enabled = false;
        config.write(&path).unwrap();

        let loaded = ScenarioConfig::from_file(&path).unwrap();
        assert_eq!(loaded, config);
        assert_eq!(loaded.clock().unit(), Duration::from_millis(10));
    }

    #[test]
    fn missing_file_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let err = ScenarioConfig::from_file(dir.path().join("absent.json")).unwrap_err();
        assert!(matches!(err, SimError::Io { .. }));
        assert!(err.to_string().contains("absent.json"));
    }

    #[test]
    fn goal_of_exactly_one_is_reachable() {
        let config = ScenarioConfig::from_json(r#"{"student": {"goal": 1.0}}"#).unwrap();
        assert!((config.student.goal - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn bad_json_is_a_parse_error() {
        assert!(matches!(
            ScenarioConfig::from_json("{\"students\": 3}"),
            Err(SimError::Parse(_))
        ));
    }

    #[test_case(r#"{"time_unit_ms": 0}"# ; "zero time unit")]
    #[test_case(r#"{"students": []}"# ; "no students")]
    #[test_case(r#"{"students": [{"name": "s", "topic": "physics", "knowledge": 1.5}]}"# ; "knowledge above one")]
    #[test_case(r#"{"students": [{"name": "", "topic": "physics", "knowledge": 0.1}]}"# ; "empty name")]
    #[test_case(r#"{"students": [{"name": "tutor1", "topic": "physics", "knowledge": 0.1}]}"# ; "name clash with tutor")]
    #[test_case(r#"{"students": [{"name": "monitor", "topic": "physics", "knowledge": 0.1}]}"# ; "name clash with service")]
    #[test_case(r#"{"resource": {"capacity": 0}}"# ; "zero capacity")]
    #[test_case(r#"{"environment": {"period": 0}}"# ; "zero period")]
    #[test_case(r#"{"student": {"goal": 1.5}}"# ; "unreachable goal")]
    #[test_case(r#"{"student": {"goal": 0}}"# ; "zero goal")]
    #[test_case(r#"{"student": {"resource_gain": -0.1}}"# ; "negative resource gain")]
    #[test_case(r#"{"tutor": {"available_expertise": 1.2}}"# ; "available expertise above one")]
    #[test_case(r#"{"tutor": {"busy_expertise": -0.5}}"# ; "negative busy expertise")]
    #[test_case(r#"{"tutor": {"wait_base": -1}}"# ; "negative wait base")]
    fn invalid_scenarios_are_rejected(json: &str) {
        assert!(ScenarioConfig::from_json(json).is_err());
    }
}
