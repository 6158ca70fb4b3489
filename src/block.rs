//! Blocking waits on transfer futures.
//! With `std` the calling thread is parked until the completion wakes it.
//! Without it the future is driven by `embassy_futures::block_on`.



use core::future::Future;



/// Blocks the calling thread until the future completes.
#[cfg(feature = "std")]
pub fn block_on<F: Future>(future: F) -> F::Output {
    use core::{
        pin::pin,

        task::{
            Context, Poll, Waker,
        },
    };

    use std::{
        sync::Arc,
        task::Wake,
        thread::{self, Thread},
    };

    /// Waker that unparks the blocked thread.
    struct Unparker(Thread);

    impl Wake for Unparker {
        fn wake(self: Arc<Self>) {
            self.0.unpark();
        }

        fn wake_by_ref(self: &Arc<Self>) {
            self.0.unpark();
        }
    }

    let mut future = pin!(future);

    let waker: Waker = Arc::new( Unparker( thread::current() ) ).into();
    let mut cx = Context::from_waker(&waker);

    loop {
        match future.as_mut().poll(&mut cx) {
            Poll::Ready(output) => return output,

            // Spurious unparks just poll again.
            Poll::Pending => thread::park(),
        }
    }
}

/// Blocks the calling thread until the future completes.
#[cfg(not(feature = "std"))]
pub fn block_on<F: Future>(future: F) -> F::Output {
    embassy_futures::block_on(future)
}
