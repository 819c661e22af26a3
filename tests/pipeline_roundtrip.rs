use pathcopy_lib::pipeline::{PopLocation, PushMethod, MAX_PIPELINE_STEPS};
use pathcopy_lib::{Pipeline, PipelineError, Step};
use proptest::prelude::*;
use uuid::Uuid;

fn text() -> impl Strategy<Value = String> {
    // Includes digits, tag characters and non-BMP characters.
    prop_oneof![".{0,12}", "[0-9\"^{}?,!]{0,6}", Just(String::new())]
}

fn int() -> impl Strategy<Value = u32> {
    prop_oneof![Just(0u32), Just(9999u32), 0u32..=9999]
}

fn id() -> impl Strategy<Value = Uuid> {
    any::<u128>().prop_map(Uuid::from_u128)
}

fn push_method() -> impl Strategy<Value = PushMethod> {
    prop_oneof![
        Just(PushMethod::Entire),
        (int(), int()).prop_map(|(begin, end)| PushMethod::Range { begin, end }),
        (text(), any::<bool>(), int()).prop_map(|(pattern, ignore_case, group)| {
            PushMethod::Regex {
                pattern,
                ignore_case,
                group,
            }
        }),
        text().prop_map(|value| PushMethod::Fixed { value }),
    ]
}

fn pop_location() -> impl Strategy<Value = PopLocation> {
    prop_oneof![
        Just(PopLocation::Entire),
        (int(), int()).prop_map(|(begin, end)| PopLocation::Range { begin, end }),
        (text(), any::<bool>())
            .prop_map(|(pattern, ignore_case)| PopLocation::Regex { pattern, ignore_case }),
        Just(PopLocation::Start),
        Just(PopLocation::End),
        Just(PopLocation::Nowhere),
    ]
}

fn unit_step() -> impl Strategy<Value = Step> {
    prop::sample::select(vec![
        Step::FollowSymlink,
        Step::Quotes,
        Step::OptionalQuotes,
        Step::EmailLinks,
        Step::EncodeWhitespace,
        Step::EncodeUriChars,
        Step::BackToForwardSlashes,
        Step::ForwardToBackslashes,
        Step::RemoveExtension,
        Step::UnexpandEnvStrings,
        Step::InjectDriveLabel,
        Step::SwapStack,
        Step::DuplicateStack,
        Step::RecursiveCopy,
    ])
}

fn string_step() -> impl Strategy<Value = Step> {
    prop_oneof![
        (text(), text()).prop_map(|(old_value, new_value)| Step::FindReplace {
            old_value,
            new_value
        }),
        (text(), text(), any::<bool>()).prop_map(|(regex, format, ignore_case)| Step::Regex {
            regex,
            format,
            ignore_case
        }),
        text().prop_map(|separator| Step::PathsSeparator { separator }),
        text().prop_map(|executable| Step::LaunchExecutable { executable }),
        text().prop_map(|executable| Step::LaunchExecutableWithFilelist { executable }),
        (text(), text(), any::<bool>()).prop_map(|(executable, arguments, use_filelist)| {
            Step::CommandLine {
                executable,
                arguments,
                use_filelist,
            }
        }),
    ]
}

fn other_step() -> impl Strategy<Value = Step> {
    prop_oneof![
        (int(), any::<bool>()).prop_map(|(num_parts, first)| Step::CopyNParts { num_parts, first }),
        id().prop_map(|plugin_id| Step::ApplyCommand { plugin_id }),
        id().prop_map(|plugin_id| Step::ApplyCompositeCommand { plugin_id }),
        push_method().prop_map(|method| Step::PushToStack { method }),
        pop_location().prop_map(|location| Step::PopFromStack { location }),
        (any::<bool>(), any::<bool>()).prop_map(|(show_for_files, show_for_folders)| {
            Step::DisplayForSelection {
                show_for_files,
                show_for_folders,
            }
        }),
    ]
}

fn step() -> impl Strategy<Value = Step> {
    prop_oneof![unit_step(), string_step(), other_step()]
}

proptest! {
    #[test]
    fn pipelines_round_trip(steps in prop::collection::vec(step(), 0..=MAX_PIPELINE_STEPS)) {
        let pipeline = Pipeline::from_steps(steps);
        let encoded = pipeline.encode().unwrap();
        prop_assert_eq!(Pipeline::decode(&encoded).unwrap(), pipeline);
    }

    #[test]
    fn truncation_never_panics(steps in prop::collection::vec(step(), 1..8), cut in 1usize..64) {
        let encoded = Pipeline::from_steps(steps).encode().unwrap();
        let chars: Vec<char> = encoded.chars().collect();
        let keep = chars.len().saturating_sub(cut);
        let truncated: String = chars[..keep].iter().collect();
        let is_malformed = matches!(
            Pipeline::decode(&truncated),
            Err(PipelineError::Malformed { .. })
        );
        prop_assert!(is_malformed);
    }

    #[test]
    fn arbitrary_input_never_panics(input in ".{0,40}") {
        let _ = Pipeline::decode(&input);
    }
}

#[test]
fn literal_scenario() {
    let pipeline = Pipeline::from_steps(vec![
        Step::Quotes,
        Step::Regex {
            regex: "a".into(),
            format: "b".into(),
            ignore_case: false,
        },
    ]);
    assert_eq!(pipeline.encode().unwrap(), "02\"^00010001a0001b0");
    assert_eq!(Pipeline::decode("02\"^00010001a0001b0").unwrap(), pipeline);
}

#[test]
fn integer_overflow_is_contract_violation() {
    let pipeline = Pipeline::from_steps(vec![Step::CopyNParts {
        num_parts: 10_000,
        first: false,
    }]);
    assert!(matches!(
        pipeline.encode(),
        Err(PipelineError::ContractViolation(_))
    ));
}

#[test]
fn unknown_tag_is_malformed() {
    assert!(matches!(
        Pipeline::decode("01Z"),
        Err(PipelineError::Malformed { .. })
    ));
}
