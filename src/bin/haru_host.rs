//! Interactive host for the animation core.
//!
//! Reads reply lines from stdin and performs each one: synthesis,
//! playback, lip sync, intent motion and overlay. A new line supersedes
//! whatever is still playing, exactly as a chat frontend would.

use haru::audio::CpalPlayback;
use haru::avatar::{ModelSurface, MotionClip, MotionGroup, ParameterSpec};
use haru::synth::RemoteSynthesizer;
use haru::{AnimatorConfig, AnimatorEvent, SpeechOrchestrator};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("haru=info")),
        )
        .init();

    let config_path = AnimatorConfig::default_config_path();
    let config = if config_path.exists() {
        AnimatorConfig::from_file(&config_path)?
    } else {
        AnimatorConfig::default()
    };
    info!("haru-host starting, endpoint {}", config.synthesis.endpoint);

    // A stand-in asset with the parameters and groups a Live2D-style model
    // typically declares; a renderer bridge reads the values each frame.
    let surface = Arc::new(ModelSurface::new(demo_parameters(), demo_groups()));
    let remote = Arc::new(RemoteSynthesizer::new(&config.synthesis)?);
    let output = Arc::new(CpalPlayback::new(&config.audio));

    let orchestrator = Arc::new(SpeechOrchestrator::new(
        surface, remote, None, output, config,
    ));

    let mut events = orchestrator.subscribe();
    tokio::spawn(async move {
        while let Ok(event) = events.recv().await {
            match event {
                AnimatorEvent::MouthLevel { .. } => {}
                other => info!("event: {other:?}"),
            }
        }
    });

    println!("type a reply line to perform it, empty line to stop, ctrl-d to quit");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let text = line.trim().to_owned();
        if text.is_empty() {
            orchestrator.stop();
            continue;
        }
        let speaker = Arc::clone(&orchestrator);
        tokio::spawn(async move {
            if let Err(e) = speaker.speak(&text).await {
                tracing::error!("speak failed: {e}");
            }
        });
    }

    orchestrator.shutdown();
    Ok(())
}

fn demo_parameters() -> Vec<ParameterSpec> {
    vec![
        ParameterSpec::new("ParamMouthOpenY", 0.0, 0.0, 1.0),
        ParameterSpec::new("ParamAngleX", 0.0, -30.0, 30.0),
        ParameterSpec::new("ParamAngleZ", 0.0, -30.0, 30.0),
        ParameterSpec::new("ParamEyeLOpen", 1.0, 0.0, 1.0),
        ParameterSpec::new("ParamEyeROpen", 1.0, 0.0, 1.0),
        ParameterSpec::new("ParamBodyAngleX", 0.0, -10.0, 10.0),
        ParameterSpec::new("ParamBrowLY", 0.0, -1.0, 1.0),
        ParameterSpec::new("ModelPositionY", 0.0, -100.0, 100.0),
    ]
}

fn demo_groups() -> Vec<MotionGroup> {
    vec![
        MotionGroup {
            name: "idle".to_owned(),
            clips: vec![MotionClip { duration_ms: 3000 }],
        },
        MotionGroup {
            name: "wave_hello".to_owned(),
            clips: vec![
                MotionClip { duration_ms: 1200 },
                MotionClip { duration_ms: 1500 },
            ],
        },
        MotionGroup {
            name: "nod_agree".to_owned(),
            clips: vec![MotionClip { duration_ms: 900 }],
        },
        MotionGroup {
            name: "shake_head".to_owned(),
            clips: vec![MotionClip { duration_ms: 900 }],
        },
        MotionGroup {
            name: "think_tilt".to_owned(),
            clips: vec![MotionClip { duration_ms: 1400 }],
        },
    ]
}
