/// Bridge-to-host push channel (the host side of `onQRCodeDetected`)
///
/// Calls are fire-and-forget: the bridge never waits for an acknowledgement
/// and implementations must not block.
pub trait HostMessenger: Send + Sync + 'static {
    fn on_qr_code_detected(&self, value: String);
}
