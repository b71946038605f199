use std::cell::RefCell;
use std::rc::Rc;

use wasm_bindgen::JsCast;
use wasm_bindgen::closure::Closure;

use arena_collect::CollectSession;

/// Keyboard and focus listeners feeding the session's input sampler. Removed
/// from the page by [`KeyListeners::detach`].
pub struct KeyListeners {
    document: web_sys::Document,
    window: web_sys::Window,
    keydown: Closure<dyn FnMut(web_sys::KeyboardEvent)>,
    keyup: Closure<dyn FnMut(web_sys::KeyboardEvent)>,
    blur: Closure<dyn FnMut(web_sys::Event)>,
}

impl KeyListeners {
    pub fn attach(
        window: &web_sys::Window,
        session: &Rc<RefCell<CollectSession>>,
    ) -> Option<Self> {
        let document = window.document()?;

        let keydown = {
            let session = Rc::clone(session);
            Closure::<dyn FnMut(web_sys::KeyboardEvent)>::new(move |evt: web_sys::KeyboardEvent| {
                // Movement keys would otherwise scroll the page.
                if session.borrow_mut().key_down(&evt.code()) {
                    evt.prevent_default();
                }
            })
        };
        let keyup = {
            let session = Rc::clone(session);
            Closure::<dyn FnMut(web_sys::KeyboardEvent)>::new(move |evt: web_sys::KeyboardEvent| {
                if session.borrow_mut().key_up(&evt.code()) {
                    evt.prevent_default();
                }
            })
        };
        // A key released while the page is unfocused never reports keyup.
        let blur = {
            let session = Rc::clone(session);
            Closure::<dyn FnMut(web_sys::Event)>::new(move |_: web_sys::Event| {
                session.borrow_mut().release_keys();
            })
        };

        let _ =
            document.add_event_listener_with_callback("keydown", keydown.as_ref().unchecked_ref());
        let _ = document.add_event_listener_with_callback("keyup", keyup.as_ref().unchecked_ref());
        let _ = window.add_event_listener_with_callback("blur", blur.as_ref().unchecked_ref());

        Some(Self {
            document,
            window: window.clone(),
            keydown,
            keyup,
            blur,
        })
    }

    pub fn detach(self) {
        let _ = self
            .document
            .remove_event_listener_with_callback("keydown", self.keydown.as_ref().unchecked_ref());
        let _ = self
            .document
            .remove_event_listener_with_callback("keyup", self.keyup.as_ref().unchecked_ref());
        let _ = self
            .window
            .remove_event_listener_with_callback("blur", self.blur.as_ref().unchecked_ref());
    }
}
