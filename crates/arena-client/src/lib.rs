#[cfg(target_family = "wasm")]
mod app;
#[cfg(target_family = "wasm")]
mod bridge;
pub mod canvas;
mod diag;
pub mod options;
#[cfg_attr(not(target_family = "wasm"), allow(dead_code))]
mod teardown;

use wasm_bindgen::prelude::*;

/// WASM entry point.
#[wasm_bindgen(start)]
pub fn start() {
    #[cfg(target_family = "wasm")]
    console_error_panic_hook::set_once();
}

/// A running collection session, owned by the page's room view. Freeing the
/// handle without calling `leave` tears the session down the same way.
#[cfg(target_family = "wasm")]
#[wasm_bindgen]
pub struct GameHandle {
    runtime: std::rc::Rc<app::Runtime>,
    teardown: teardown::Teardown,
}

#[cfg(target_family = "wasm")]
#[wasm_bindgen]
impl GameHandle {
    /// Seconds left on the session clock.
    #[wasm_bindgen(js_name = remainingSecs)]
    pub fn remaining_secs(&self) -> u32 {
        self.runtime.session.borrow().remaining_secs()
    }

    pub fn score(&self) -> u32 {
        self.runtime.session.borrow().score()
    }

    /// Whether the outcome has been persisted.
    #[wasm_bindgen(js_name = isFinished)]
    pub fn is_finished(&self) -> bool {
        self.runtime.session.borrow().phase() == arena_collect::finalizer::FinalizerState::Finalized
    }

    /// Tear the session down and remove the local participant. Safe to call
    /// more than once.
    pub fn leave(&mut self) {
        self.teardown.run();
    }
}

/// Start a session in the given room and begin drawing on the canvas.
/// `options_json` is a serialized [`options::SessionOptions`].
#[cfg(target_family = "wasm")]
#[wasm_bindgen(js_name = startSession)]
pub async fn start_session(options_json: String) -> Result<GameHandle, JsValue> {
    use std::rc::Rc;

    use arena_collect::CollectSession;
    use arena_rest::RestStore;

    let options = options::SessionOptions::from_json(&options_json).map_err(JsValue::from)?;

    let window = web_sys::window().ok_or_else(|| JsValue::from_str("no window"))?;
    let document = window
        .document()
        .ok_or_else(|| JsValue::from_str("no document"))?;
    let canvas: web_sys::HtmlCanvasElement = document
        .get_element_by_id(&options.canvas_id)
        .ok_or_else(|| JsValue::from_str("canvas not found"))?
        .dyn_into()
        .map_err(|_| JsValue::from_str("element is not a canvas"))?;
    let config = options.collect_config();
    canvas.set_width(config.arena_width as u32);
    canvas.set_height(config.arena_height as u32);
    let ctx: web_sys::CanvasRenderingContext2d = canvas
        .get_context("2d")?
        .ok_or_else(|| JsValue::from_str("2d context unavailable"))?
        .dyn_into()?;

    let store = Rc::new(RestStore::new(options.store.clone()).map_err(|e| e.to_string())?);
    let session = CollectSession::start(
        &*store,
        options.room_id,
        options.participant_id,
        options.game_kind,
        config,
    )
    .await
    .map_err(|e| JsValue::from_str(&e.to_string()))?;
    diag::console_info!(
        "joined room {} with {} participants",
        options.room_id,
        session.state().roster.len()
    );

    let runtime = app::Runtime::new(session, store, ctx);
    let handles = app::LoopHandles::start(&window, &runtime).map_err(JsValue::from)?;
    let teardown = {
        let runtime = Rc::clone(&runtime);
        teardown::Teardown::new(move || app::teardown(&runtime, handles))
    };
    Ok(GameHandle { runtime, teardown })
}
