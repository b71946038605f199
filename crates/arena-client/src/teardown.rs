/// Runs a cleanup action exactly once: on the first [`run`](Self::run), or
/// when dropped if `run` was never called.
pub struct Teardown {
    action: Option<Box<dyn FnOnce()>>,
}

impl Teardown {
    pub fn new(action: impl FnOnce() + 'static) -> Self {
        Self {
            action: Some(Box::new(action)),
        }
    }

    pub fn run(&mut self) {
        if let Some(action) = self.action.take() {
            action();
        }
    }

    #[cfg(test)]
    fn is_done(&self) -> bool {
        self.action.is_none()
    }
}

impl Drop for Teardown {
    fn drop(&mut self) {
        self.run();
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::rc::Rc;

    use super::*;

    fn counted() -> (Rc<Cell<u32>>, Teardown) {
        let runs = Rc::new(Cell::new(0));
        let teardown = {
            let runs = Rc::clone(&runs);
            Teardown::new(move || runs.set(runs.get() + 1))
        };
        (runs, teardown)
    }

    #[test]
    fn dropping_without_run_still_cleans_up() {
        let (runs, teardown) = counted();
        assert!(!teardown.is_done());
        drop(teardown);
        assert_eq!(runs.get(), 1);
    }

    #[test]
    fn explicit_run_then_drop_cleans_up_once() {
        let (runs, mut teardown) = counted();
        teardown.run();
        teardown.run();
        assert!(teardown.is_done());
        drop(teardown);
        assert_eq!(runs.get(), 1);
    }
}
