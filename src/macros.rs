/// Sends an update to the app, logging instead of panicking if it's gone.
#[macro_export]
macro_rules! broadcast {
    ($tx:expr, $data:expr) => {
        if $tx.send($data.into()).is_err() {
            tracing::error!("Failed to broadcast message, app receiver closed");
        }
    };
    ($tx:expr, $data:expr, $err_msg:expr) => {
        if $tx.send($data.into()).is_err() {
            tracing::error!("{}", $err_msg);
        }
    };
}
