//! User-defined command pipelines and their persisted text encoding.
//!
//! A pipeline is an ordered list of [`Step`]s. It is stored as
//!
//! ```text
//! Pipeline := ElementCount(2 digits) Element*
//! Element  := Tag(1 char) Payload
//! ```
//!
//! Decoding must accept every encoding older releases produced and reject
//! anything else with [`PipelineError::Malformed`], which always carries the
//! full offending string so the UI can tell the user a newer version
//! probably wrote it.

pub(crate) mod codec;
pub mod element;
pub mod stack;

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use thiserror::Error;
use tracing::{error, warn};
use uuid::Uuid;

use crate::version::{Version, PIPELINE_MIN_VERSION};
use codec::{DecodeError, Decoder, Encoder};
pub use element::{Step, REGEX_STEP_VERSION};
pub use stack::{PopLocation, PushMethod};

/// Most steps a pipeline can hold; the count prefix is two digits.
pub const MAX_PIPELINE_STEPS: usize = 99;

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum PipelineError {
    /// Input could not be decoded: truncated, unknown tag, unsupported
    /// sub-version or trailing characters.
    #[error("malformed pipeline ({reason}): {encoded:?}")]
    Malformed { encoded: String, reason: String },
    /// The caller asked to encode something the format cannot represent.
    #[error("pipeline contract violation: {0}")]
    ContractViolation(String),
}

/// Build a contract violation and log it; these are programming errors.
pub(crate) fn contract_violation(message: String) -> PipelineError {
    error!("pipeline contract violation: {message}");
    PipelineError::ContractViolation(message)
}

/// Ordered sequence of steps making up a user-defined command.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Pipeline {
    steps: Vec<Step>,
}

impl Pipeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_steps(steps: Vec<Step>) -> Self {
        Self { steps }
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub fn into_steps(self) -> Vec<Step> {
        self.steps
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Step> {
        self.steps.iter()
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn push(&mut self, step: Step) {
        self.steps.push(step);
    }

    /// Insert at `index`, clamped to the end of the pipeline.
    pub fn insert(&mut self, index: usize, step: Step) {
        let index = index.min(self.steps.len());
        self.steps.insert(index, step);
    }

    pub fn remove(&mut self, index: usize) -> Option<Step> {
        (index < self.steps.len()).then(|| self.steps.remove(index))
    }

    /// Swap the step at `index` with the one before it. Returns false at the top.
    pub fn move_up(&mut self, index: usize) -> bool {
        if index == 0 || index >= self.steps.len() {
            return false;
        }
        self.steps.swap(index - 1, index);
        true
    }

    /// Swap the step at `index` with the one after it. Returns false at the bottom.
    pub fn move_down(&mut self, index: usize) -> bool {
        if index + 1 >= self.steps.len() {
            return false;
        }
        self.steps.swap(index, index + 1);
        true
    }

    pub fn clear(&mut self) {
        self.steps.clear();
    }

    /// Oldest application version able to run every step of this pipeline.
    pub fn required_version(&self) -> Version {
        self.steps
            .iter()
            .map(Step::required_version)
            .max()
            .unwrap_or(PIPELINE_MIN_VERSION)
    }

    /// Commands referenced by apply-command steps, in step order.
    pub fn referenced_plugins(&self) -> Vec<Uuid> {
        self.steps
            .iter()
            .filter_map(|step| match step {
                Step::ApplyCommand { plugin_id } | Step::ApplyCompositeCommand { plugin_id } => {
                    Some(*plugin_id)
                }
                _ => None,
            })
            .collect()
    }

    /// Validation issues keyed by step index.
    pub fn validate(&self) -> Vec<(usize, String)> {
        self.steps
            .iter()
            .enumerate()
            .flat_map(|(i, step)| step.validate().into_iter().map(move |issue| (i, issue)))
            .collect()
    }

    pub fn encode(&self) -> Result<String, PipelineError> {
        let mut enc = Encoder::new();
        enc.count(self.steps.len())?;
        for step in &self.steps {
            enc.tag(step.tag());
            step.encode_payload(&mut enc)?;
        }
        Ok(enc.finish())
    }

    /// Decode a pipeline. Nothing is returned unless the whole string decodes.
    pub fn decode(encoded: &str) -> Result<Self, PipelineError> {
        decode_steps(encoded)
            .map(Self::from_steps)
            .map_err(|e| {
                warn!("failed to decode pipeline {encoded:?}: {e}");
                PipelineError::Malformed {
                    encoded: encoded.to_string(),
                    reason: e.to_string(),
                }
            })
    }
}

fn decode_steps(encoded: &str) -> Result<Vec<Step>, DecodeError> {
    let mut dec = Decoder::new(encoded);
    let count = dec.count()?;
    let mut steps = Vec::with_capacity(count);
    for _ in 0..count {
        let tag = dec.tag()?;
        steps.push(Step::decode(tag, &mut dec)?);
    }
    if !dec.is_at_end() {
        return Err(dec.error(format!(
            "{} unexpected trailing characters",
            dec.remaining_chars()
        )));
    }
    Ok(steps)
}

impl FromStr for Pipeline {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::decode(s)
    }
}

impl FromIterator<Step> for Pipeline {
    fn from_iter<I: IntoIterator<Item = Step>>(iter: I) -> Self {
        Self::from_steps(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a Pipeline {
    type Item = &'a Step;
    type IntoIter = std::slice::Iter<'a, Step>;

    fn into_iter(self) -> Self::IntoIter {
        self.steps.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::element::tests::one_of_each;
    use super::*;

    fn sample() -> Pipeline {
        Pipeline::from_steps(vec![
            Step::Quotes,
            Step::Regex {
                regex: "a".into(),
                format: "b".into(),
                ignore_case: false,
            },
        ])
    }

    #[test]
    fn scenario_wire_form() {
        let encoded = sample().encode().unwrap();
        assert_eq!(encoded, "02\"^00010001a0001b0");
        assert_eq!(Pipeline::decode(&encoded).unwrap(), sample());
    }

    #[test]
    fn empty_pipeline() {
        let empty = Pipeline::new();
        assert_eq!(empty.encode().unwrap(), "00");
        assert_eq!(Pipeline::decode("00").unwrap(), empty);
        assert_eq!(empty.required_version(), PIPELINE_MIN_VERSION);
    }

    #[test]
    fn all_kinds_in_one_pipeline() {
        let pipeline = Pipeline::from_steps(one_of_each());
        let encoded = pipeline.encode().unwrap();
        assert!(encoded.starts_with("26"));
        assert_eq!(Pipeline::decode(&encoded).unwrap(), pipeline);
    }

    #[test]
    fn ninety_nine_steps_encode() {
        let pipeline: Pipeline = std::iter::repeat_n(Step::Quotes, 99).collect();
        let encoded = pipeline.encode().unwrap();
        assert!(encoded.starts_with("99"));
        assert_eq!(Pipeline::decode(&encoded).unwrap().len(), 99);
    }

    #[test]
    fn hundred_steps_is_contract_violation() {
        let pipeline: Pipeline = std::iter::repeat_n(Step::Quotes, 100).collect();
        assert!(matches!(
            pipeline.encode(),
            Err(PipelineError::ContractViolation(_))
        ));
    }

    #[test]
    fn every_truncation_is_malformed() {
        let encoded = Pipeline::from_steps(one_of_each()).encode().unwrap();
        let chars: Vec<char> = encoded.chars().collect();
        for cut in 1..=chars.len() {
            let truncated: String = chars[..chars.len() - cut].iter().collect();
            match Pipeline::decode(&truncated) {
                Err(PipelineError::Malformed { encoded, .. }) => assert_eq!(encoded, truncated),
                other => panic!("truncating {cut} chars gave {other:?}"),
            }
        }
    }

    #[test]
    fn unknown_tag_is_malformed() {
        for input in ["01Z", "01Zabc", "01Z0001"] {
            assert!(matches!(
                Pipeline::decode(input),
                Err(PipelineError::Malformed { .. })
            ));
        }
    }

    #[test]
    fn trailing_garbage_is_malformed() {
        let err = Pipeline::decode("01\"x").unwrap_err();
        match err {
            PipelineError::Malformed { encoded, reason } => {
                assert_eq!(encoded, "01\"x");
                assert!(reason.contains("trailing"));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn bad_count_prefix_is_malformed() {
        for input in ["", "0", "x1", "-1\""] {
            assert!(Pipeline::decode(input).is_err(), "{input:?}");
        }
    }

    #[test]
    fn error_message_carries_original_string() {
        let err = Pipeline::decode("01^00090000").unwrap_err();
        assert!(err.to_string().contains("01^00090000"));
    }

    #[test]
    fn required_version_is_max_of_steps() {
        let mut pipeline = sample();
        assert_eq!(pipeline.required_version(), PIPELINE_MIN_VERSION);
        pipeline.push(Step::CopyNParts {
            num_parts: 1,
            first: true,
        });
        assert_eq!(pipeline.required_version(), Version::major(16));
        pipeline.push(Step::DuplicateStack);
        assert_eq!(pipeline.required_version(), Version::major(19));
    }

    #[test]
    fn editing_helpers() {
        let mut pipeline = sample();
        pipeline.insert(100, Step::RemoveExtension);
        assert_eq!(pipeline.steps()[2], Step::RemoveExtension);

        assert!(pipeline.move_up(2));
        assert_eq!(pipeline.steps()[1], Step::RemoveExtension);
        assert!(!pipeline.move_up(0));
        assert!(pipeline.move_down(0));
        assert_eq!(pipeline.steps()[1], Step::Quotes);
        assert!(!pipeline.move_down(2));

        assert_eq!(pipeline.remove(0), Some(Step::RemoveExtension));
        assert_eq!(pipeline.remove(5), None);
        assert_eq!(pipeline.len(), 2);
    }

    #[test]
    fn referenced_plugins_in_order() {
        let a = Uuid::from_u128(1);
        let b = Uuid::from_u128(2);
        let pipeline = Pipeline::from_steps(vec![
            Step::ApplyCompositeCommand { plugin_id: b },
            Step::Quotes,
            Step::ApplyCommand { plugin_id: a },
        ]);
        assert_eq!(pipeline.referenced_plugins(), vec![b, a]);
    }

    #[test]
    fn validate_reports_step_index() {
        let pipeline = Pipeline::from_steps(vec![
            Step::Quotes,
            Step::CopyNParts {
                num_parts: 0,
                first: true,
            },
        ]);
        let issues = pipeline.validate();
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].0, 1);
    }

    #[test]
    fn from_str_decodes() {
        let pipeline: Pipeline = "01.".parse().unwrap();
        assert_eq!(pipeline.steps(), &[Step::RemoveExtension]);
    }
}
