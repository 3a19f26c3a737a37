//! Play a template preview in real time.
//!
//! Drives a [`FrameLoop`] from a paced tokio loop and prints the visible
//! layer set whenever it changes.

use std::time::Duration;

use karo_common::clock::{Clock, RateController, SystemClock};
use karo_common::config::AppConfig;
use karo_render_engine::frame_loop::FrameLoop;
use karo_render_engine::preview::{PreviewOptions, Previewer};
use karo_template_model::customization::Customization;

use super::{load_template, CustomizationArgs};

pub async fn run(
    config: &AppConfig,
    template: String,
    fps: Option<u32>,
    seconds: Option<f64>,
    width: Option<f64>,
    loop_playback: bool,
    customization: CustomizationArgs,
) -> anyhow::Result<()> {
    let definition = load_template(config, &template)?;
    let customization: Customization = customization.build()?;

    let fps = fps.unwrap_or(definition.fps).max(1);
    let options = PreviewOptions {
        loop_playback,
        container_width: width,
        ..PreviewOptions::from(&config.preview)
    };

    let clock = SystemClock::start();
    let frame_loop = FrameLoop::new();
    let mut previewer = Previewer::mount(
        definition,
        customization,
        options,
        &frame_loop,
        Box::new(clock.clone()),
    )?;

    let duration = previewer.playback().duration_secs;
    let run_for = seconds.filter(|s| s.is_finite() && *s > 0.0).unwrap_or(duration);
    println!(
        "Previewing {} ({}s at {}fps, scale {:.3}) for {:.1}s",
        template,
        duration,
        fps,
        previewer.scale(),
        run_for
    );

    let mut pacing = RateController::new(fps);
    let mut last_layers: Vec<String> = vec![];
    previewer.play();

    loop {
        let now_ns = clock.elapsed_ns();
        if SystemClock::ns_to_secs(now_ns) >= run_for {
            break;
        }
        if !pacing.should_tick(now_ns) {
            tokio::time::sleep(Duration::from_nanos(pacing.until_next_ns(now_ns))).await;
            continue;
        }

        frame_loop.tick(clock.now_secs());
        if let Some(frame) = previewer.last_frame() {
            let layers: Vec<String> = frame.layer_ids().into_iter().map(String::from).collect();
            if layers != last_layers {
                println!("  {:>7.3}s  [{}]", frame.time_secs, layers.join(", "));
                last_layers = layers;
            }
        }
        if !previewer.playback().is_playing {
            println!("  Reached the end.");
            break;
        }
    }

    let frames = previewer.frames_composed();
    previewer.unmount();
    println!(
        "Composed {} frames in {:.1}s ({} loop ticks)",
        frames,
        clock.now_secs(),
        frame_loop.frame_count()
    );

    Ok(())
}
