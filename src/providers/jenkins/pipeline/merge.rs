use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// Fans `inputs` into one stream.
///
/// Items from one input keep their relative order; there is no order across
/// inputs. The output closes once every input has closed (or on
/// cancellation), never before.
pub fn merge<T>(
    inputs: Vec<mpsc::Receiver<T>>,
    capacity: usize,
    cancel: &CancellationToken,
) -> mpsc::Receiver<T>
where
    T: Send + 'static,
{
    let (tx, rx) = mpsc::channel(capacity.max(1));

    for mut input in inputs {
        let tx = tx.clone();
        let cancel = cancel.clone();
        tokio::spawn(async move {
            loop {
                let item = tokio::select! {
                    _ = cancel.cancelled() => break,
                    item = input.recv() => item,
                };
                let Some(item) = item else { break };

                tokio::select! {
                    _ = cancel.cancelled() => break,
                    sent = tx.send(item) => {
                        if sent.is_err() {
                            break;
                        }
                    }
                }
            }
        });
    }

    // Each forwarder holds its own sender, all registered above. Dropping
    // this one leaves the forwarders as the only senders, so the output
    // closes exactly when the last of them finishes.
    drop(tx);

    rx
}
