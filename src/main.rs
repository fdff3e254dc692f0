use anyhow::{bail, Result};
use inquire::{Confirm, Select, Text};
use promoflow::core::config::Config;
use promoflow::core::model::{Audience, PublishTarget};
use promoflow::services::gateway::create_gateway;
use promoflow::services::workflow::WorkflowManager;
use std::time::Duration;

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();

    // 1. Load Config
    let config = Config::load()?;

    // 2. Initialize the Generation Gateway
    let gateway = create_gateway(&config.gateway)?;

    // 3. Initialize the Workflow
    let manager = WorkflowManager::new(config, gateway);

    // 4. Collect Product Input
    collect_input(&manager)?;

    // 5. Pain-Point Analysis
    run_analysis(&manager).await?;

    // 6. Adopt a Card
    pick_card(&manager)?;

    // 7. Produce the Selected Output
    match manager.snapshot().input.publish_target {
        PublishTarget::ShortVideo => produce_video(&manager).await?,
        PublishTarget::SocialPost => produce_social_post(&manager).await?,
    }

    println!("Workflow finished.");
    Ok(())
}

fn collect_input(manager: &WorkflowManager) -> Result<()> {
    let defaults = manager.snapshot().input;

    let product_name = Text::new("Product or business:")
        .with_default(&defaults.product_name)
        .prompt()?;
    let persona = Text::new("Spokesperson persona:")
        .with_default(&defaults.persona)
        .prompt()?;
    let target_customer = Text::new("Target customer:")
        .with_default(&defaults.target_customer)
        .prompt()?;
    let keywords_raw = Text::new("Keywords (comma or newline separated):")
        .with_default(&defaults.keywords_raw)
        .prompt()?;

    let audiences = [Audience::Business, Audience::Consumer];
    let labels: Vec<String> = audiences.iter().map(|a| a.to_string()).collect();
    let picked = Select::new("Audience type:", labels.clone()).prompt()?;
    let audience = audiences[labels.iter().position(|l| *l == picked).unwrap_or(0)];

    let targets = [PublishTarget::ShortVideo, PublishTarget::SocialPost];
    let target_labels = vec!["短视频".to_string(), "社媒文案".to_string()];
    let picked = Select::new("Output format:", target_labels.clone()).prompt()?;
    let publish_target = targets[target_labels.iter().position(|l| *l == picked).unwrap_or(0)];

    manager.update_input(|input| {
        input.product_name = product_name;
        input.persona = persona;
        input.target_customer = target_customer;
        input.keywords_raw = keywords_raw;
        input.audience = audience;
        input.publish_target = publish_target;
    });
    Ok(())
}

async fn run_analysis(manager: &WorkflowManager) -> Result<()> {
    loop {
        let pb = spinner("Analyzing customer pain points...")?;
        let result = manager.run_analysis().await;
        pb.finish_and_clear();

        match result {
            Ok(()) => {
                println!(
                    "Analysis produced {} pain-point cards.",
                    manager.snapshot().cards.len()
                );
                return Ok(());
            }
            Err(err) => {
                eprintln!("Analysis failed: {}", err);
                let retry = Confirm::new("Retry the analysis?")
                    .with_default(true)
                    .prompt()?;
                if !retry {
                    return Err(err.into());
                }
            }
        }
    }
}

fn pick_card(manager: &WorkflowManager) -> Result<()> {
    let cards = manager.snapshot().cards;
    if cards.is_empty() {
        bail!("analysis returned no cards to adopt");
    }

    let labels: Vec<String> = cards
        .iter()
        .map(|card| format!("{} - {}", card.title, card.pain_point))
        .collect();
    let picked = Select::new("Adopt a pain-point card:", labels.clone()).prompt()?;
    let index = labels.iter().position(|l| *l == picked).unwrap_or(0);

    manager.adopt_card(&cards[index].id)?;
    manager.advance_to_output()?;
    Ok(())
}

async fn produce_video(manager: &WorkflowManager) -> Result<()> {
    let pb = spinner("Generating the video script...")?;
    let result = manager.ensure_script().await;
    pb.finish_and_clear();
    let script = result?;
    println!("Script: {} ({} scenes)", script.headline, script.scenes.len());

    let redo = Confirm::new("Regenerate the script before rendering?")
        .with_default(false)
        .prompt()?;
    if redo {
        let pb = spinner("Regenerating the video script...")?;
        let result = manager.regenerate_script().await;
        pb.finish_and_clear();
        let script = result?;
        println!("New script: {} ({} scenes)", script.headline, script.scenes.len());
    }

    let pb = spinner("Submitting the video job...")?;
    let result = manager.generate_video().await;
    pb.finish_and_clear();
    result?;

    if manager.snapshot().video.is_none() {
        let st = manager.snapshot();
        let detail = st.last_error.as_deref().unwrap_or("no job was submitted");
        bail!("video generation did not start: {}", detail);
    }

    loop {
        if manager.snapshot().polling {
            let pb = spinner("Waiting for the render to finish...")?;
            while manager.snapshot().polling {
                tokio::time::sleep(Duration::from_millis(500)).await;
            }
            pb.finish_and_clear();
        }

        let st = manager.snapshot();
        if let Some(url) = st.resolved_video_url() {
            println!("Video ready: {}", url);
            if let Some(audio) = st.video.as_ref().and_then(|job| job.audio_url.as_deref()) {
                println!("Audio track: {}", audio);
            }
            return Ok(());
        }

        let status = st
            .video
            .as_ref()
            .and_then(|job| job.status.as_deref())
            .unwrap_or("unknown");
        println!("Video not ready yet (status: {}).", status);
        if let Some(err) = st.last_error.as_deref() {
            println!("Last error: {}", err);
        }

        let again = Confirm::new("Keep waiting?").with_default(true).prompt()?;
        if !again {
            println!("Stopping here. The tracked job stays in state.");
            return Ok(());
        }
        if !manager.resume_polling() {
            bail!("no pending video job to wait for");
        }
    }
}

async fn produce_social_post(manager: &WorkflowManager) -> Result<()> {
    let pb = spinner("Generating social-post copies...")?;
    let result = manager.generate_social_copies().await;
    pb.finish_and_clear();
    result?;

    let social = manager.snapshot().social;
    if social.is_empty() {
        bail!("the gateway returned no social copies");
    }
    println!(
        "Received {} copies, showing the first {}.",
        social.copies.len(),
        social.featured().len()
    );

    let labels: Vec<String> = social
        .featured()
        .iter()
        .enumerate()
        .map(|(i, copy)| format!("{}. {}", i + 1, copy))
        .collect();
    let picked = Select::new("Pick a copy to publish:", labels.clone()).prompt()?;
    let index = labels.iter().position(|l| *l == picked).unwrap_or(0);
    manager.select_social_copy(index)?;

    if let Some(copy) = manager.snapshot().social.selected_copy() {
        println!("Selected copy:\n{}", copy);
    }
    Ok(())
}

fn spinner(message: &str) -> Result<indicatif::ProgressBar> {
    let pb = indicatif::ProgressBar::new_spinner();
    pb.set_style(
        indicatif::ProgressStyle::default_spinner()
            .template("{spinner:.green} [{elapsed_precise}] {msg}")?,
    );
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(120));
    Ok(pb)
}
