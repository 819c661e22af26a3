use pathcopy_lib::config::Settings;
use pathcopy_lib::export::{export_to_file, import_from_file, ExportError, ExportRevision};
use pathcopy_lib::pipeline::{PopLocation, PushMethod};
use pathcopy_lib::plugin::{EditMode, PipelinePlugin};
use pathcopy_lib::{Pipeline, Step, Version};
use tempfile::TempDir;
use uuid::Uuid;

fn stack_command() -> PipelinePlugin {
    let mut plugin = PipelinePlugin::new(
        Uuid::from_u128(0x51ac),
        "File name in front",
        Pipeline::from_steps(vec![
            Step::PushToStack {
                method: PushMethod::Regex {
                    pattern: r"[^\\]+$".into(),
                    ignore_case: false,
                    group: 0,
                },
            },
            Step::PopFromStack {
                location: PopLocation::Start,
            },
        ]),
    );
    plugin.edit_mode = Some(EditMode::Expert);
    plugin
}

#[test]
fn each_revision_round_trips_what_it_can_hold() {
    let dir = TempDir::new().unwrap();
    for revision in ExportRevision::ALL {
        let path = dir.path().join(format!("cmds.{}", revision.extension()));
        assert_eq!(export_to_file(&path, &[stack_command()]).unwrap(), revision);

        let back = import_from_file(&path).unwrap();
        assert_eq!(back.len(), 1);
        assert_eq!(back[0].pipeline, stack_command().pipeline);
        // Stack steps imply the newest requirement even when the file
        // doesn't say so.
        assert_eq!(back[0].required_version, Version::major(19));

        let expected_mode = (revision == ExportRevision::V3).then_some(EditMode::Expert);
        assert_eq!(back[0].edit_mode, expected_mode, "{revision:?}");
    }
}

#[test]
fn imported_commands_can_be_stored_in_settings() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("shared.pipelines2");
    export_to_file(&path, &[stack_command()]).unwrap();

    let mut settings = Settings::default();
    for plugin in import_from_file(&path).unwrap() {
        settings.upsert_pipeline_plugin(&plugin).unwrap();
    }
    let (stored, failures) = settings.user_plugins();
    assert!(failures.is_empty());
    assert_eq!(stored[0].id, stack_command().id);
    assert_eq!(stored[0].encoded_pipeline().unwrap(), stack_command().encoded_pipeline().unwrap());
}

#[test]
fn unknown_extension_is_rejected_before_touching_disk() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("cmds.xml");
    assert!(matches!(
        export_to_file(&path, &[stack_command()]),
        Err(ExportError::UnknownExtension(_))
    ));
    assert!(!path.exists());
}
