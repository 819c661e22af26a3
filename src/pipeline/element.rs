//! Pipeline steps and their per-kind wire payloads.
//!
//! Each step kind owns a single-character tag. Tags are part of the
//! persisted format: a retired tag is never reused, new kinds get unused
//! characters. Payload field order is fixed once released.

use regex::RegexBuilder;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::codec::{DecodeError, Decoder, Encoder};
use super::stack::{PopLocation, PushMethod};
use super::PipelineError;
use crate::version::{Version, PIPELINE_MIN_VERSION};

/// Newest regex payload revision this build can read and the one it writes.
pub const REGEX_STEP_VERSION: u32 = 1;

/// One transformation applied to a copied path.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum Step {
    /// Resolve symbolic links before anything else touches the path.
    FollowSymlink,
    /// Surround with double quotes.
    Quotes,
    /// Surround with double quotes only if the path contains spaces.
    OptionalQuotes,
    /// Surround with `<` and `>` for e-mail clients.
    EmailLinks,
    /// Replace whitespace with `%20`.
    EncodeWhitespace,
    /// Percent-encode characters that are invalid in URIs.
    EncodeUriChars,
    BackToForwardSlashes,
    ForwardToBackslashes,
    RemoveExtension,
    FindReplace {
        old_value: String,
        new_value: String,
    },
    Regex {
        regex: String,
        format: String,
        ignore_case: bool,
    },
    /// Replace known folders with their environment variable form.
    UnexpandEnvStrings,
    /// Prefix the path with the drive's volume label.
    InjectDriveLabel,
    /// Keep only `num_parts` path components, counted from the start or the end.
    CopyNParts { num_parts: u32, first: bool },
    /// Run another command on the path and continue with its output.
    ApplyCommand { plugin_id: Uuid },
    /// Like [`Step::ApplyCommand`], for commands that are themselves pipelines.
    ApplyCompositeCommand { plugin_id: Uuid },
    PushToStack { method: PushMethod },
    PopFromStack { location: PopLocation },
    SwapStack,
    DuplicateStack,
    /// Separator between paths when several files are copied at once.
    PathsSeparator { separator: String },
    /// Expand selected folders into every file they contain.
    RecursiveCopy,
    LaunchExecutable { executable: String },
    LaunchExecutableWithFilelist { executable: String },
    CommandLine {
        executable: String,
        arguments: String,
        use_filelist: bool,
    },
    DisplayForSelection {
        show_for_files: bool,
        show_for_folders: bool,
    },
}

impl Step {
    /// Wire discriminator for this kind.
    pub fn tag(&self) -> char {
        match self {
            Step::FollowSymlink => 'k',
            Step::Quotes => '"',
            Step::OptionalQuotes => 'q',
            Step::EmailLinks => '<',
            Step::EncodeWhitespace => 's',
            Step::EncodeUriChars => '%',
            Step::BackToForwardSlashes => '\\',
            Step::ForwardToBackslashes => '/',
            Step::RemoveExtension => '.',
            Step::FindReplace { .. } => '?',
            Step::Regex { .. } => '^',
            Step::UnexpandEnvStrings => 'e',
            Step::InjectDriveLabel => ':',
            Step::CopyNParts { .. } => 'n',
            Step::ApplyCommand { .. } => '{',
            Step::ApplyCompositeCommand { .. } => '}',
            Step::PushToStack { .. } => 'u',
            Step::PopFromStack { .. } => 'o',
            Step::SwapStack => 'w',
            Step::DuplicateStack => 'd',
            Step::PathsSeparator { .. } => ',',
            Step::RecursiveCopy => 'v',
            Step::LaunchExecutable { .. } => 'x',
            Step::LaunchExecutableWithFilelist { .. } => 'f',
            Step::CommandLine { .. } => '>',
            Step::DisplayForSelection { .. } => '!',
        }
    }

    /// Oldest application version able to interpret this step.
    pub fn required_version(&self) -> Version {
        match self {
            Step::Quotes
            | Step::EmailLinks
            | Step::EncodeWhitespace
            | Step::BackToForwardSlashes
            | Step::ForwardToBackslashes
            | Step::RemoveExtension
            | Step::FindReplace { .. }
            | Step::Regex { .. }
            | Step::ApplyCommand { .. } => PIPELINE_MIN_VERSION,
            Step::EncodeUriChars | Step::PathsSeparator { .. } => Version::major(11),
            Step::UnexpandEnvStrings | Step::LaunchExecutable { .. } => Version::major(12),
            Step::FollowSymlink | Step::LaunchExecutableWithFilelist { .. } => Version::major(13),
            Step::InjectDriveLabel => Version::major(14),
            Step::RecursiveCopy => Version::major(15),
            Step::CopyNParts { .. } | Step::CommandLine { .. } => Version::major(16),
            Step::OptionalQuotes | Step::DisplayForSelection { .. } => Version::major(17),
            Step::ApplyCompositeCommand { .. } => Version::major(18),
            Step::PushToStack { .. }
            | Step::PopFromStack { .. }
            | Step::SwapStack
            | Step::DuplicateStack => Version::major(19),
        }
    }

    /// Write this step's payload (not its tag).
    pub(crate) fn encode_payload(&self, enc: &mut Encoder) -> Result<(), PipelineError> {
        match self {
            Step::FollowSymlink
            | Step::Quotes
            | Step::OptionalQuotes
            | Step::EmailLinks
            | Step::EncodeWhitespace
            | Step::EncodeUriChars
            | Step::BackToForwardSlashes
            | Step::ForwardToBackslashes
            | Step::RemoveExtension
            | Step::UnexpandEnvStrings
            | Step::InjectDriveLabel
            | Step::SwapStack
            | Step::DuplicateStack
            | Step::RecursiveCopy => Ok(()),
            Step::FindReplace {
                old_value,
                new_value,
            } => {
                enc.string(old_value)?;
                enc.string(new_value)
            }
            Step::Regex {
                regex,
                format,
                ignore_case,
            } => {
                enc.int(REGEX_STEP_VERSION)?;
                enc.string(regex)?;
                enc.string(format)?;
                enc.boolean(*ignore_case);
                Ok(())
            }
            Step::CopyNParts { num_parts, first } => {
                enc.int(*num_parts)?;
                enc.boolean(*first);
                Ok(())
            }
            Step::ApplyCommand { plugin_id } | Step::ApplyCompositeCommand { plugin_id } => {
                enc.identifier(plugin_id);
                Ok(())
            }
            Step::PushToStack { method } => method.encode(enc),
            Step::PopFromStack { location } => location.encode(enc),
            Step::PathsSeparator { separator } => enc.string(separator),
            Step::LaunchExecutable { executable }
            | Step::LaunchExecutableWithFilelist { executable } => enc.string(executable),
            Step::CommandLine {
                executable,
                arguments,
                use_filelist,
            } => {
                enc.string(executable)?;
                enc.string(arguments)?;
                enc.boolean(*use_filelist);
                Ok(())
            }
            Step::DisplayForSelection {
                show_for_files,
                show_for_folders,
            } => {
                enc.boolean(*show_for_files);
                enc.boolean(*show_for_folders);
                Ok(())
            }
        }
    }

    /// Read the payload of a step whose tag was just consumed.
    pub(crate) fn decode(tag: char, dec: &mut Decoder<'_>) -> Result<Self, DecodeError> {
        let step = match tag {
            'k' => Step::FollowSymlink,
            '"' => Step::Quotes,
            'q' => Step::OptionalQuotes,
            '<' => Step::EmailLinks,
            's' => Step::EncodeWhitespace,
            '%' => Step::EncodeUriChars,
            '\\' => Step::BackToForwardSlashes,
            '/' => Step::ForwardToBackslashes,
            '.' => Step::RemoveExtension,
            '?' => Step::FindReplace {
                old_value: dec.string()?,
                new_value: dec.string()?,
            },
            '^' => {
                let version = dec.int()?;
                if version > REGEX_STEP_VERSION {
                    return Err(dec.error(format!(
                        "regex step version {version} is newer than supported version {REGEX_STEP_VERSION}"
                    )));
                }
                Step::Regex {
                    regex: dec.string()?,
                    format: dec.string()?,
                    ignore_case: dec.boolean()?,
                }
            }
            'e' => Step::UnexpandEnvStrings,
            ':' => Step::InjectDriveLabel,
            'n' => Step::CopyNParts {
                num_parts: dec.int()?,
                first: dec.boolean()?,
            },
            '{' => Step::ApplyCommand {
                plugin_id: dec.identifier()?,
            },
            '}' => Step::ApplyCompositeCommand {
                plugin_id: dec.identifier()?,
            },
            'u' => Step::PushToStack {
                method: PushMethod::decode(dec)?,
            },
            'o' => Step::PopFromStack {
                location: PopLocation::decode(dec)?,
            },
            'w' => Step::SwapStack,
            'd' => Step::DuplicateStack,
            ',' => Step::PathsSeparator {
                separator: dec.string()?,
            },
            'v' => Step::RecursiveCopy,
            'x' => Step::LaunchExecutable {
                executable: dec.string()?,
            },
            'f' => Step::LaunchExecutableWithFilelist {
                executable: dec.string()?,
            },
            '>' => Step::CommandLine {
                executable: dec.string()?,
                arguments: dec.string()?,
                use_filelist: dec.boolean()?,
            },
            '!' => Step::DisplayForSelection {
                show_for_files: dec.boolean()?,
                show_for_folders: dec.boolean()?,
            },
            other => return Err(dec.error(format!("unknown element tag {other:?}"))),
        };
        Ok(step)
    }

    /// Problems worth showing before the user saves this step.
    ///
    /// Validation never blocks encoding; a step with issues still encodes and
    /// decodes unchanged.
    pub fn validate(&self) -> Vec<String> {
        let mut issues = Vec::new();
        match self {
            Step::FindReplace { old_value, .. } if old_value.is_empty() => {
                issues.push("text to find is empty".to_string());
            }
            Step::Regex {
                regex, ignore_case, ..
            } => check_regex(regex, *ignore_case, &mut issues),
            Step::CopyNParts { num_parts: 0, .. } => {
                issues.push("number of path parts to copy must be at least 1".to_string());
            }
            Step::PushToStack { method } => match method {
                PushMethod::Range { begin, end } => check_range(*begin, *end, &mut issues),
                PushMethod::Regex {
                    pattern,
                    ignore_case,
                    ..
                } => check_regex(pattern, *ignore_case, &mut issues),
                PushMethod::Entire | PushMethod::Fixed { .. } => {}
            },
            Step::PopFromStack { location } => match location {
                PopLocation::Range { begin, end } => check_range(*begin, *end, &mut issues),
                PopLocation::Regex {
                    pattern,
                    ignore_case,
                } => check_regex(pattern, *ignore_case, &mut issues),
                _ => {}
            },
            Step::LaunchExecutable { executable }
            | Step::LaunchExecutableWithFilelist { executable }
            | Step::CommandLine { executable, .. }
                if executable.trim().is_empty() =>
            {
                issues.push("executable path is empty".to_string());
            }
            Step::DisplayForSelection {
                show_for_files: false,
                show_for_folders: false,
            } => {
                issues.push("command is hidden for both files and folders".to_string());
            }
            _ => {}
        }
        issues
    }
}

fn check_regex(pattern: &str, ignore_case: bool, issues: &mut Vec<String>) {
    if pattern.is_empty() {
        issues.push("regular expression is empty".to_string());
        return;
    }
    if let Err(e) = RegexBuilder::new(pattern)
        .case_insensitive(ignore_case)
        .build()
    {
        issues.push(format!("invalid regular expression: {e}"));
    }
}

fn check_range(begin: u32, end: u32, issues: &mut Vec<String>) {
    if begin > end {
        issues.push(format!("range start {begin} is after range end {end}"));
    }
}
