// Boundaries to the collaborators this client drives but does not own
use crate::application::chart_presenter::ChartFrame;
use crate::infrastructure::protocol::ClientCommand;

/// Outbound command channel to the bridge.
pub trait CommandSink {
    /// Returns false, without raising, when there is no live connection.
    fn send(&mut self, command: &ClientCommand) -> bool;

    fn is_connected(&self) -> bool;
}

/// Switches the transport between Online and Offline. Both return false
/// when the session was already in that mode.
pub trait SessionControl {
    fn go_online(&mut self) -> bool;

    fn go_offline(&mut self) -> bool;
}

/// The widget that actually paints the chart.
pub trait ChartSurface: Send {
    fn render(&mut self, frame: ChartFrame);
}

/// Per-probe cards (number, current value, target) outside the chart.
pub trait ProbeObserver: Send {
    fn probe_added(&mut self, probe: usize, color: &str);

    fn current_value(&mut self, probe: usize, text: &str);

    fn target_changed(&mut self, probe: usize, text: &str);

    /// Called when a full history replaces every card.
    fn reset(&mut self);
}

/// The looping alarm tone. At most one voice plays at a time.
pub trait AlarmSound: Send {
    fn start(&mut self);

    fn stop(&mut self);
}
