//! Upload orchestration
//!
//! Strictly sequential pass over one controller:
//!
//! ```text
//! Validate -> AllocatePorts -> AllocateSmartRemotes -> Validate2
//!   -> InputUniverses -> SmartReceivers -> PixelOutputs -> Serial
//!   -> [Unpack] -> Reboot -> Done
//! ```
//!
//! Everything up to `Validate2` is pre-flight: a failure there returns an
//! error and nothing is written. The upload steps after it are all
//! attempted; their failures are collected in the outcome. Reboot is
//! always attempted last.

use crate::allocator::{allocate_ports, bind_universes, check_pixel_outputs, ChannelAllocator};
use crate::controller::HinksPix;
use crate::error::{Result, UploadError};
use crate::layout::{Layout, OutputKind};
use crate::model::{InputUniverse, PixelOutput, SerialOutput, SmartRemoteTable};
use crate::smart_remote::{check_smart_receivers, group_remotes};
use crate::transport::ControlPlane;
use crate::unpack::UnpackTable;
use std::time::Duration;
use tracing::{error, info, warn};

/// Receives `(percent, message)` after each step
pub trait Progress {
    fn update(&mut self, percent: u32, message: &str);
}

impl<F: FnMut(u32, &str)> Progress for F {
    fn update(&mut self, percent: u32, message: &str) {
        self(percent, message)
    }
}

/// Progress sink that drops everything
pub struct NoProgress;

impl Progress for NoProgress {
    fn update(&mut self, _percent: u32, _message: &str) {}
}

/// Result of the upload steps
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadOutcome {
    pub worked: bool,
    /// One line per failed step, naming the step
    pub failures: Vec<String>,
}

impl Default for UploadOutcome {
    fn default() -> Self {
        Self {
            worked: true,
            failures: Vec::new(),
        }
    }
}

impl UploadOutcome {
    fn record(&mut self, step: &str, result: Result<()>) {
        if let Err(e) = result {
            error!("{} FAILED: {}", step, e);
            self.worked = false;
            self.failures.push(format!("{}: {}", step, e));
        }
    }

    /// Human-readable summary, `None` when every step worked
    pub fn diagnostic(&self) -> Option<String> {
        if self.worked {
            None
        } else {
            Some(format!("HinksPix Upload Error:\n{}", self.failures.join("\n")))
        }
    }
}

/// Upload `layout` to the controller
///
/// Pre-flight problems are returned as errors; upload-step problems end
/// up in the returned outcome.
pub fn upload<C: ControlPlane>(
    controller: &mut HinksPix<C>,
    layout: &Layout,
    reboot_gap: Duration,
    progress: &mut impl Progress,
) -> Result<UploadOutcome> {
    let plan = match prepare(controller, layout, progress) {
        Ok(plan) => plan,
        Err(e) => {
            error!("Upload aborted: {}", e);
            progress.update(100, "Aborting.");
            return Err(e);
        }
    };
    let kind = layout.output_kind();
    let mut outcome = UploadOutcome::default();

    step(progress, 30, "Uploading Input Universes Information.");
    outcome.record(
        "Input universes",
        controller.upload_input_universes(layout, &plan.universes),
    );

    step(progress, 60, "Uploading SmartReceivers Information.");
    outcome.record("Smart receivers", controller.upload_smart_remotes(&plan.remotes));

    step(progress, 70, "Uploading String Output Information.");
    outcome.record("String outputs", controller.upload_pixel_outputs(&plan.outputs));

    step(progress, 80, "Uploading DMX Output Information.");
    outcome.record(
        "DMX output",
        controller.upload_serial(&plan.serial, kind, layout.serial_port(1).is_some()),
    );

    if let Some(table) = &plan.unpack {
        step(progress, 85, "Uploading UnPack Information.");
        outcome.record("UnPack", controller.upload_unpack(table));
    }

    step(progress, 90, "Rebooting Controller.");
    outcome.record("Reboot", controller.reboot(reboot_gap));

    progress.update(100, "Done.");
    Ok(outcome)
}

/// Everything computed before the first write
struct UploadPlan {
    outputs: Vec<PixelOutput>,
    serial: SerialOutput,
    universes: Vec<InputUniverse>,
    remotes: SmartRemoteTable,
    unpack: Option<UnpackTable>,
}

fn step(progress: &mut impl Progress, percent: u32, message: &str) {
    info!("{}", message);
    progress.update(percent, message);
}

fn prepare<C: ControlPlane>(
    controller: &mut HinksPix<C>,
    layout: &Layout,
    progress: &mut impl Progress,
) -> Result<UploadPlan> {
    let settings = &layout.controller;
    let kind = layout.output_kind();
    let per_string = settings.universe_per_string;

    // Validate
    if layout.outputs.is_empty() {
        return Err(UploadError::configuration(
            "Controller has no network outputs to upload",
        ));
    }
    controller.check_compatible(layout)?;
    if kind == OutputKind::Ddp && per_string {
        return Err(UploadError::configuration(
            "Universe Per String not allowed with DDP Output",
        ));
    }
    let unpack_supported = controller.unpack_supported(&settings.model);
    if per_string && unpack_supported {
        warn!(
            "HinksPix requires fewer universes with 'Universe Per String' disabled; the unpack table is skipped"
        );
    }
    step(progress, 0, "Scanning models");

    step(progress, 5, "Initializing Pixel Output Information.");
    let mut outputs =
        controller.read_pixel_outputs(settings.full_control, settings.default_brightness);
    let mut serial = controller.read_serial(settings.full_control);

    step(progress, 10, "Calculating Universe Start Channel Mappings.");
    let mut universes = bind_universes(&layout.outputs, !per_string && kind != OutputKind::Ddp);

    // AllocatePorts / AllocateSmartRemotes
    step(progress, 15, "Figuring Out Pixel Output Information.");
    let mut allocator = ChannelAllocator::new(per_string);
    allocate_ports(layout, &mut allocator, &mut outputs, &mut universes)?;
    let remotes = group_remotes(layout)?;
    let unpack = (unpack_supported && !per_string).then(|| UnpackTable::build(layout, &outputs));

    // Validate2
    step(progress, 20, "Checking Pixel Output and SmartReceivers Information.");
    check_pixel_outputs(&outputs, controller.expansions())?;
    check_smart_receivers(&remotes, controller.expansions())?;

    step(progress, 25, "Figuring Out DMX Output Information.");
    if let Some(port) = layout.serial_port(1) {
        allocator.allocate_serial(port, kind, &mut serial, &mut universes);
    }
    for uni in &universes {
        uni.dump();
    }

    Ok(UploadPlan {
        outputs,
        serial,
        universes,
        remotes,
        unpack,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_diagnostic() {
        let mut outcome = UploadOutcome::default();
        outcome.record("Reboot", Ok(()));
        assert!(outcome.worked);
        assert_eq!(outcome.diagnostic(), None);

        outcome.record(
            "String outputs",
            Err(UploadError::Rejected {
                operation: "pixel outputs".into(),
                reply: "ERR".into(),
            }),
        );
        assert!(!outcome.worked);
        assert_eq!(
            outcome.diagnostic().unwrap(),
            "HinksPix Upload Error:\nString outputs: pixel outputs rejected by controller: 'ERR'"
        );
    }

    #[test]
    fn test_closure_progress() {
        let mut seen = Vec::new();
        {
            let mut sink = |p: u32, m: &str| seen.push((p, m.to_string()));
            step(&mut sink, 30, "x");
        }
        assert_eq!(seen, vec![(30, "x".to_string())]);
    }
}
