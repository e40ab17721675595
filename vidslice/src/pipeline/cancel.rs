use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/**
    Cooperative cancellation flag.

    Cloned tokens share one flag. The driver checks it between packets, so
    cancellation never interrupts an in-flight decode or encode call; a
    cancelled run takes the same finalize-and-exit path as a completed one.
*/
#[derive(Clone, Debug, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /**
        Ask the run to stop at the next loop iteration.
    */
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    /**
        Whether cancellation has been requested.
    */
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_the_flag() {
        let token = CancelToken::new();
        let clone = token.clone();
        assert!(!clone.is_cancelled());

        token.cancel();
        assert!(clone.is_cancelled());
    }

    #[test]
    fn visible_across_threads() {
        let token = CancelToken::new();
        let remote = token.clone();
        std::thread::spawn(move || remote.cancel())
            .join()
            .expect("join");
        assert!(token.is_cancelled());
    }
}
