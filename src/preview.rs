//! Live preview of a pipeline being edited.
//!
//! The shell extension can only run commands it finds in persisted settings,
//! so previewing saves the pipeline under a reserved identifier and removes it
//! again afterwards. [`TempPipelineGuard`] ties that removal to scope exit.

use tracing::{debug, warn};
use uuid::Uuid;

use crate::pipeline::Pipeline;

/// Reserved identifier of the preview command.
pub const TEMP_PIPELINE_ID: Uuid = Uuid::from_u128(0x2c1e_55a0_8b7d_4f21_9d3e_61b4_a7c0_0e59);

/// Persistence side of the preview. Implemented by whatever owns settings
/// storage.
pub trait TempPipelineStore {
    fn save_temp(&self, id: Uuid, encoded: &str) -> Result<(), String>;
    fn delete_temp(&self, id: Uuid) -> Result<(), String>;
}

/// Holds a saved temp command; deletes it when dropped.
pub struct TempPipelineGuard<'a, S: TempPipelineStore + ?Sized> {
    store: &'a S,
    id: Uuid,
}

impl<'a, S: TempPipelineStore + ?Sized> TempPipelineGuard<'a, S> {
    pub fn new(store: &'a S, pipeline: &Pipeline) -> Result<Self, String> {
        let encoded = pipeline.encode().map_err(|e| e.to_string())?;
        store.save_temp(TEMP_PIPELINE_ID, &encoded)?;
        debug!(steps = pipeline.len(), "saved temp pipeline");
        Ok(Self {
            store,
            id: TEMP_PIPELINE_ID,
        })
    }

    pub fn id(&self) -> Uuid {
        self.id
    }
}

impl<S: TempPipelineStore + ?Sized> Drop for TempPipelineGuard<'_, S> {
    fn drop(&mut self) {
        if let Err(e) = self.store.delete_temp(self.id) {
            warn!("failed to delete temp pipeline {}: {e}", self.id);
        }
    }
}

/// Run `f` while `pipeline` is saved as the temp command.
pub fn with_temp_pipeline<S, T>(
    store: &S,
    pipeline: &Pipeline,
    f: impl FnOnce(Uuid) -> T,
) -> Result<T, String>
where
    S: TempPipelineStore + ?Sized,
{
    let guard = TempPipelineGuard::new(store, pipeline)?;
    Ok(f(guard.id()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::Step;
    use parking_lot::Mutex;

    #[derive(Default)]
    struct Recorder {
        log: Mutex<Vec<String>>,
        fail_save: bool,
        fail_delete: bool,
    }

    impl Recorder {
        fn log(&self) -> Vec<String> {
            self.log.lock().clone()
        }
    }

    impl TempPipelineStore for Recorder {
        fn save_temp(&self, id: Uuid, encoded: &str) -> Result<(), String> {
            if self.fail_save {
                return Err("registry is read-only".into());
            }
            self.log.lock().push(format!("save {id} {encoded}"));
            Ok(())
        }

        fn delete_temp(&self, id: Uuid) -> Result<(), String> {
            self.log.lock().push(format!("delete {id}"));
            if self.fail_delete {
                return Err("gone".into());
            }
            Ok(())
        }
    }

    fn quotes() -> Pipeline {
        Pipeline::from_steps(vec![Step::Quotes])
    }

    #[test]
    fn saves_then_deletes() {
        let store = Recorder::default();
        let seen = with_temp_pipeline(&store, &quotes(), |id| {
            assert_eq!(store.log().len(), 1);
            id
        })
        .unwrap();
        assert_eq!(seen, TEMP_PIPELINE_ID);
        assert_eq!(
            store.log(),
            vec![
                format!("save {TEMP_PIPELINE_ID} 01\""),
                format!("delete {TEMP_PIPELINE_ID}"),
            ]
        );
    }

    #[test]
    fn deletes_on_panic() {
        let store = Recorder::default();
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            with_temp_pipeline(&store, &quotes(), |_| panic!("preview crashed"))
        }));
        assert!(result.is_err());
        assert_eq!(store.log().last().unwrap(), &format!("delete {TEMP_PIPELINE_ID}"));
    }

    #[test]
    fn save_failure_passes_through_and_skips_delete() {
        let store = Recorder {
            fail_save: true,
            ..Default::default()
        };
        let err = with_temp_pipeline(&store, &quotes(), |_| ()).unwrap_err();
        assert_eq!(err, "registry is read-only");
        assert!(store.log().is_empty());
    }

    #[test]
    fn delete_failure_is_not_fatal() {
        let store = Recorder {
            fail_delete: true,
            ..Default::default()
        };
        assert_eq!(with_temp_pipeline(&store, &quotes(), |_| 5).unwrap(), 5);
    }

    #[test]
    fn unencodable_pipeline_is_not_saved() {
        let store = Recorder::default();
        let big: Pipeline = std::iter::repeat_n(Step::Quotes, 100).collect();
        assert!(TempPipelineGuard::new(&store, &big).is_err());
        assert!(store.log().is_empty());
    }

    #[test]
    fn works_through_trait_object() {
        let store = Recorder::default();
        let dyn_store: &dyn TempPipelineStore = &store;
        let guard = TempPipelineGuard::new(dyn_store, &quotes()).unwrap();
        drop(guard);
        assert_eq!(store.log().len(), 2);
    }
}
