//! Submit a render job and follow it to completion.

use karo_common::config::AppConfig;
use karo_render_engine::render_job::{
    render_and_wait, HttpRenderJobClient, OutputFormat, PollOptions, ProgressCallback, Quality,
    RenderJobClient, RenderRequest,
};

use super::{load_template, CustomizationArgs};

#[allow(clippy::too_many_arguments)]
pub async fn run(
    config: &AppConfig,
    template: String,
    title: Option<String>,
    format: String,
    quality: String,
    wait: bool,
    max_polls: Option<u32>,
    customization: CustomizationArgs,
) -> anyhow::Result<()> {
    let definition = load_template(config, &template)?;
    let customization = customization.build()?;

    let output_format = match format.as_str() {
        "mp4" => OutputFormat::Mp4,
        "webm" => OutputFormat::Webm,
        "gif" => OutputFormat::Gif,
        _ => {
            return Err(anyhow::anyhow!("Unknown format: {format}. Use: mp4, webm, gif"));
        }
    };
    let quality = match quality.as_str() {
        "low" => Quality::Low,
        "medium" => Quality::Medium,
        "high" => Quality::High,
        "ultra" => Quality::Ultra,
        _ => {
            return Err(anyhow::anyhow!(
                "Unknown quality: {quality}. Use: low, medium, high, ultra"
            ));
        }
    };

    let mut request = RenderRequest::new(&definition.id, customization)
        .with_format(output_format)
        .with_quality(quality);
    if let Some(title) = title {
        request = request.with_title(title);
    }

    let client = HttpRenderJobClient::new(&config.render_service)?;

    let options = PollOptions {
        max_polls,
        ..PollOptions::from(&config.render_service)
    };
    let progress_cb: ProgressCallback = Box::new(|status| {
        print!("\r  Progress: {:>3}% ({})  ", status.progress, status.status);
    });

    println!("Submitting render of '{}' to {}", definition.id, config.render_service.base_url);
    if !wait {
        let handle = client.submit(&request).await?;
        println!("  Job: {}", handle.job_id);
        println!("  Submitted: {}", handle.submitted_at.to_rfc3339());
        return Ok(());
    }

    match render_and_wait(&client, &request, options, Some(&progress_cb)).await {
        Ok(status) => {
            println!("\nRender complete: {}", status.output_url.as_deref().unwrap_or("(no url)"));
            if let Some(thumbnail) = &status.thumbnail_url {
                println!("  Thumbnail: {thumbnail}");
            }
        }
        Err(e) => {
            println!();
            return Err(anyhow::anyhow!("Render failed: {e}"));
        }
    }

    Ok(())
}
