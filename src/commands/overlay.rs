use tokio::task::JoinHandle;

use crate::bus::EventBus;
use crate::models::overlay::{start_event, stream_event, OverlayCommand};

/// Listen for `<command>:start` and show the command's video overlay
pub fn start(bus: &EventBus, command: &'static OverlayCommand) -> JoinHandle<()> {
    let publisher = bus.clone();

    super::on(bus, start_event(command.command), move |_| {
        let publisher = publisher.clone();
        async move {
            let payload = command.assemble_payload();
            publisher.publish(stream_event(command.command), payload);
        }
    })
}
