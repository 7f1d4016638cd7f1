use anyhow::Result;
use log::LevelFilter;
use nalgebra::Vector3;
use tag_localizer::lifecycle::LifecycleNode;
use tag_localizer::perception::sensors::{DetectionSource, ScriptedSource};
use tag_localizer::{Parameters, PerceptionStack, PoseCandidate, TagDetection, TagId};

const PARAMS: &str = r#"{
    "Camera": {"frame_width": 640, "frame_height": 480, "fps": 30,
               "fx": 600.0, "fy": 600.0, "cx": 320.0, "cy": 240.0},
    "apriltag_detection": {"tag_family": "tag16h5", "tag_size": 0.1524,
                           "detection_margin_threshold": 35.0,
                           "detection_iterations": 50}
}"#;

/// A detection whose better candidate sits `perpendicular` in front of the
/// camera and `parallel` to the side, turned by `rotation`.
fn synthetic(id: TagId, perpendicular: f64, parallel: f64, rotation: f64) -> TagDetection {
    TagDetection {
        id,
        family: "tag16h5".to_string(),
        hamming: 0,
        decision_margin: 60.0,
        center: [320.0 + 100.0 * parallel, 240.0],
        corners: [[0.0; 2]; 4],
        pose_candidates: vec![
            PoseCandidate::new(
                Vector3::new(parallel, 0.0, perpendicular),
                Vector3::new(0.0, rotation, 0.0),
                0.002,
            ),
            PoseCandidate::new(
                Vector3::new(parallel, 0.0, perpendicular),
                Vector3::new(0.0, -rotation, 0.0),
                0.02,
            ),
        ],
    }
}

fn main() -> Result<()> {
    tag_localizer::logging::init_with_level(LevelFilter::Info)?;
    log::info!("Initializing localizer core...");

    let mut stack = PerceptionStack::new(Parameters::from_json_str(PARAMS)?);
    stack.on_configure()?;
    stack.on_activate()?;

    let mut source = ScriptedSource::new(vec![
        // tags 1 and 2 agree on (3.1, 0.6, 0.125) on average
        vec![synthetic(1, 2.0, 0.5, 0.1), synthetic(2, 1.2, 0.7, 0.15)],
        // nothing seen: the previous pose is kept
        Vec::new(),
        // unknown tag only
        vec![synthetic(99, 1.0, 0.0, 0.0)],
    ]);

    while let Some(detections) = source.next_frame()? {
        let report = stack.process_frame(&detections)?;
        println!(
            "frame {}: pose={:?} last_pose={:?} tags={:?} skipped={}",
            report.frame, report.pose, report.last_pose, report.tags_used, report.skipped
        );
    }

    stack.on_deactivate()?;
    stack.on_cleanup()?;
    log::info!("Core shutdown successfully!");
    Ok(())
}
