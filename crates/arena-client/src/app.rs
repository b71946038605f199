use std::cell::{Cell, RefCell};
use std::rc::Rc;

use wasm_bindgen::JsCast;
use wasm_bindgen::closure::Closure;
use wasm_bindgen_futures::spawn_local;

use arena_collect::outbox::{self, StoreWrite};
use arena_collect::{CollectSession, finalizer};
use arena_core::store::RemoteStore;
use arena_rest::RestStore;

use crate::bridge::KeyListeners;
use crate::canvas;
use crate::diag::{console_info, console_warn};

/// Every this many polls the roster is rebuilt from a full participant read,
/// so a missed change cannot leave a stale mirror behind.
const RESYNC_EVERY_POLLS: u32 = 20;

/// Shared state behind every browser callback of one session.
pub struct Runtime {
    pub session: Rc<RefCell<CollectSession>>,
    pub store: Rc<RestStore>,
    ctx: web_sys::CanvasRenderingContext2d,
    polling: Cell<bool>,
    polls: Cell<u32>,
}

impl Runtime {
    pub fn new(
        session: CollectSession,
        store: Rc<RestStore>,
        ctx: web_sys::CanvasRenderingContext2d,
    ) -> Rc<Self> {
        Rc::new(Self {
            session: Rc::new(RefCell::new(session)),
            store,
            ctx,
            polling: Cell::new(false),
            polls: Cell::new(0),
        })
    }

    /// Send a write without waiting on it. Failures are reported and dropped.
    fn send(self: &Rc<Self>, write: StoreWrite) {
        let store = Rc::clone(&self.store);
        spawn_local(async move {
            if let Err(e) = outbox::dispatch(&*store, &write).await {
                console_warn!("participant write dropped: {e}");
            }
        });
    }

    /// Animation callback: one gated simulation tick, outbound writes, paint.
    fn on_frame(self: &Rc<Self>, now_ms: f64) {
        let (writes, frame) = {
            let mut session = self.session.borrow_mut();
            session.tick(now_ms);
            (session.take_writes(), session.frame())
        };
        for write in writes {
            self.send(write);
        }
        canvas::paint(&self.ctx, &frame);
    }

    /// One-second timer: count down, and on expiry persist the outcome.
    fn on_second(self: &Rc<Self>) {
        let plan = self.session.borrow_mut().on_second();
        let Some(plan) = plan else {
            return;
        };
        let rt = Rc::clone(self);
        spawn_local(async move {
            let report = finalizer::persist(&*rt.store, &plan).await;
            if report.is_complete() {
                console_info!(
                    "session finished: score {} rank {}",
                    plan.record.score,
                    plan.record.rank
                );
            } else {
                console_warn!(
                    "session finished with {} failed writes",
                    report.failures()
                );
            }
            rt.session.borrow_mut().complete_finalization(&report);
        });
    }

    /// Poll timer: re-read the room for remote changes, periodically resync
    /// the whole roster, and fetch any profiles that have not loaded yet.
    /// Skipped while a previous poll is in flight.
    fn on_poll(self: &Rc<Self>) {
        if self.polling.replace(true) {
            return;
        }
        let polls = self.polls.get().wrapping_add(1);
        self.polls.set(polls);
        let resync = polls % RESYNC_EVERY_POLLS == 0;
        let rt = Rc::clone(self);
        spawn_local(async move {
            if let Err(e) = rt.store.poll_changes().await {
                console_warn!("participant poll failed: {e}");
            }
            if resync {
                let room_id = rt.session.borrow().state().room_id;
                match rt.store.read_participants(room_id).await {
                    Ok(rows) => rt.session.borrow_mut().apply_snapshot(rows),
                    Err(e) => console_warn!("participant resync failed: {e}"),
                }
            }
            let missing = rt.session.borrow().missing_profiles();
            if !missing.is_empty() {
                match rt.store.read_players(&missing).await {
                    Ok(players) => rt.session.borrow_mut().add_profiles(players),
                    Err(e) => console_warn!("profile load failed: {e}"),
                }
            }
            rt.polling.set(false);
        });
    }
}

/// Scheduled browser callbacks for a running session. Dropping without
/// [`cancel`](Self::cancel) leaves them scheduled.
pub struct LoopHandles {
    window: web_sys::Window,
    raf_id: Rc<Cell<Option<i32>>>,
    raf: Rc<RefCell<Option<Closure<dyn FnMut(f64)>>>>,
    clock_id: i32,
    _clock: Closure<dyn FnMut()>,
    poll_id: i32,
    _poll: Closure<dyn FnMut()>,
    keys: Option<KeyListeners>,
}

impl LoopHandles {
    /// Start the animation loop, the one-second clock, the poll timer, and the
    /// keyboard listeners.
    pub fn start(window: &web_sys::Window, rt: &Rc<Runtime>) -> Result<Self, String> {
        let keys = KeyListeners::attach(window, &rt.session);

        let raf_id: Rc<Cell<Option<i32>>> = Rc::new(Cell::new(None));
        let raf: Rc<RefCell<Option<Closure<dyn FnMut(f64)>>>> = Rc::new(RefCell::new(None));
        {
            let rt = Rc::clone(rt);
            let window_loop = window.clone();
            let raf_loop = Rc::clone(&raf);
            let raf_id_loop = Rc::clone(&raf_id);
            *raf.borrow_mut() = Some(Closure::<dyn FnMut(f64)>::new(move |now_ms: f64| {
                rt.on_frame(now_ms);
                if let Some(cb) = raf_loop.borrow().as_ref()
                    && let Ok(id) = window_loop.request_animation_frame(cb.as_ref().unchecked_ref())
                {
                    raf_id_loop.set(Some(id));
                }
            }));
        }
        if let Some(cb) = raf.borrow().as_ref() {
            let id = window
                .request_animation_frame(cb.as_ref().unchecked_ref())
                .map_err(|e| format!("requestAnimationFrame failed: {e:?}"))?;
            raf_id.set(Some(id));
        }

        let clock = {
            let rt = Rc::clone(rt);
            Closure::<dyn FnMut()>::new(move || rt.on_second())
        };
        let clock_id = window
            .set_interval_with_callback_and_timeout_and_arguments_0(
                clock.as_ref().unchecked_ref(),
                1_000,
            )
            .map_err(|e| format!("setInterval failed: {e:?}"))?;

        let poll = {
            let rt = Rc::clone(rt);
            Closure::<dyn FnMut()>::new(move || rt.on_poll())
        };
        let poll_ms = i32::try_from(rt.store.config().poll_interval_ms).unwrap_or(i32::MAX);
        let poll_id = window
            .set_interval_with_callback_and_timeout_and_arguments_0(
                poll.as_ref().unchecked_ref(),
                poll_ms,
            )
            .map_err(|e| format!("setInterval failed: {e:?}"))?;

        Ok(Self {
            window: window.clone(),
            raf_id,
            raf,
            clock_id,
            _clock: clock,
            poll_id,
            _poll: poll,
            keys,
        })
    }

    /// Stop every callback so nothing keeps ticking after teardown.
    pub fn cancel(mut self) {
        if let Some(id) = self.raf_id.take() {
            let _ = self.window.cancel_animation_frame(id);
        }
        // Breaks the closure's reference to itself.
        self.raf.borrow_mut().take();
        self.window.clear_interval_with_handle(self.clock_id);
        self.window.clear_interval_with_handle(self.poll_id);
        if let Some(keys) = self.keys.take() {
            keys.detach();
        }
    }
}

/// Leave the room: stop the loops, cancel the change feed, and delete the
/// local participant row.
pub fn teardown(rt: &Rc<Runtime>, handles: LoopHandles) {
    handles.cancel();
    let departure = rt.session.borrow_mut().leave();
    if let Some(id) = departure.subscription {
        rt.store.unsubscribe(id);
    }
    rt.send(departure.write);
}
