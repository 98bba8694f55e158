use anyhow::Result;
use rfd::MessageDialog;
use tao::{
    dpi::LogicalSize,
    event::{Event, WindowEvent},
    event_loop::{ControlFlow, EventLoop},
    window::WindowBuilder,
};
use tracing::info;
use wry::WebViewBuilder;

/// Opens the dashboard in a native window. Blocks until the window is closed.
pub fn launch_gui(port: u16) -> Result<()> {
    let event_loop = EventLoop::new();
    let window = WindowBuilder::new()
        .with_title("WiFi Speed Booster")
        .with_inner_size(LogicalSize::new(1200, 860))
        .with_resizable(true)
        .build(&event_loop)?;

    let url = format!("http://localhost:{}/optimize", port);
    let _webview = WebViewBuilder::new(&window).with_url(&url).build()?;

    info!("Dashboard window opened at {}", url);

    event_loop.run(move |event, _, control_flow| {
        *control_flow = ControlFlow::Wait;

        if let Event::WindowEvent {
            event: WindowEvent::CloseRequested,
            ..
        } = event
        {
            let result = MessageDialog::new()
                .set_title("Exit WiFi Speed Booster")
                .set_description("Close the dashboard?\n\nA speed test in progress will not be recorded.")
                .set_buttons(rfd::MessageButtons::YesNo)
                .show();

            if result == rfd::MessageDialogResult::Yes {
                info!("Dashboard window closed");
                *control_flow = ControlFlow::Exit;
                // the web server thread doesn't stop on its own
                std::process::exit(0);
            }
        }
    });
}
