//! Local executor backed by the browser microtask queue.

use std::future::Future;

use futures::{
    future::LocalFutureObj,
    task::{LocalSpawn, SpawnError},
};

#[derive(Debug, Clone, Copy, Default)]
/// [`LocalSpawn`] implementation over `wasm_bindgen_futures::spawn_local`.
///
/// Outside `wasm32` there is no event loop to hand work to, so spawning fails.
pub struct WasmSpawner;

impl LocalSpawn for WasmSpawner {
    fn spawn_local_obj(&self, future: LocalFutureObj<'static, ()>) -> Result<(), SpawnError> {
        #[cfg(target_arch = "wasm32")]
        {
            wasm_bindgen_futures::spawn_local(future);
            Ok(())
        }

        #[cfg(not(target_arch = "wasm32"))]
        {
            drop(future);
            Err(SpawnError::shutdown())
        }
    }
}

/// Spawns `task` on the browser event loop, logging when that is impossible.
pub fn spawn_local_task(task: impl Future<Output = ()> + 'static) {
    if let Err(err) = WasmSpawner.spawn_local_obj(LocalFutureObj::new(Box::new(task))) {
        leptos::logging::warn!("file chooser task could not be spawned: {err}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(not(target_arch = "wasm32"))]
    #[test]
    fn spawning_fails_without_browser_event_loop() {
        let err = WasmSpawner
            .spawn_local_obj(LocalFutureObj::new(Box::new(async {})))
            .expect_err("no event loop");
        assert!(err.is_shutdown());
    }
}
