//! Status rendering for the console

use std::fmt::Write;

use leveler_core::controller::StatusSnapshot;

/// Multi-line, human-readable status report
pub fn render_status(status: &StatusSnapshot) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "state:       {}", status.state.name());

    match (status.orientation, status.tilt_degrees()) {
        (Some(o), Some(tilt)) => {
            let _ = writeln!(
                out,
                "orientation: roll {:+.2}°  pitch {:+.2}°  tilt {:.2}°{}",
                o.roll.to_degrees(),
                o.pitch.to_degrees(),
                tilt,
                if status.orientation_stale { "  (stale)" } else { "" }
            );
        }
        _ => {
            let _ = writeln!(out, "orientation: no sample");
        }
    }

    let _ = writeln!(
        out,
        "commanded:   roll {:+.2}°  pitch {:+.2}°",
        status.commanded.roll.to_degrees(),
        status.commanded.pitch.to_degrees()
    );
    let _ = writeln!(
        out,
        "calibrated:  imu {}  actuators {}",
        yes_no(status.imu_calibrated),
        yes_no(status.actuators_calibrated)
    );
    let _ = writeln!(out, "auto-level:  {}", if status.auto_level_enabled { "on" } else { "off" });
    if let Some(result) = status.last_cycle {
        let _ = writeln!(out, "last cycle:  {}", result);
    }

    for actuator in status.actuators.iter() {
        let mut flags = String::new();
        if actuator.at_min_limit {
            flags.push_str(" [min]");
        }
        if actuator.at_max_limit {
            flags.push_str(" [max]");
        }
        if let Some(kind) = actuator.fault_kind.filter(|_| actuator.fault) {
            let _ = write!(flags, " FAULT: {}", kind);
        }
        let _ = writeln!(
            out,
            "  #{}: {:7.1} mm -> {:7.1} mm  travel {:6.1} mm{}",
            actuator.index,
            actuator.current_length * 1000.0,
            actuator.target_length * 1000.0,
            actuator.travel() * 1000.0,
            flags
        );
    }
    out.trim_end().to_string()
}

fn yes_no(value: bool) -> &'static str {
    if value {
        "yes"
    } else {
        "no"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use leveler_core::actuator::ActuatorState;
    use leveler_core::controller::CycleResult;
    use leveler_core::error::FaultKind;
    use leveler_core::state::State;
    use leveler_core::traits::Orientation;

    fn snapshot() -> StatusSnapshot {
        let mut actuators = heapless::Vec::new();
        for index in 0..3u8 {
            let mut state = ActuatorState::new(index);
            state.current_length = 0.35;
            state.target_length = 0.4;
            state.zero_offset = 0.3;
            let _ = actuators.push(state);
        }
        actuators[1].fault = true;
        actuators[1].fault_kind = Some(FaultKind::Stall);
        actuators[2].at_min_limit = true;

        let orientation = Orientation::from_degrees(1.5, -0.25, 0.0, 2.0);
        StatusSnapshot {
            state: State::AutoLeveling,
            orientation: Some(orientation),
            tilt: Some(orientation.tilt()),
            commanded: Orientation::from_degrees(-1.0, 0.5, 0.0, 0.0),
            actuators,
            auto_level_enabled: true,
            orientation_stale: false,
            last_cycle: Some(CycleResult::Success),
            imu_calibrated: true,
            actuators_calibrated: true,
            timestamp_ms: 2_000,
        }
    }

    #[test]
    fn renders_every_section() {
        let text = render_status(&snapshot());
        assert!(text.starts_with("state:       auto-leveling"));
        assert!(text.contains("roll +1.50°  pitch -0.25°"));
        assert!(text.contains("commanded:   roll -1.00°  pitch +0.50°"));
        assert!(text.contains("auto-level:  on"));
        assert!(text.contains("last cycle:  success"));
        assert_eq!(text.lines().filter(|l| l.trim_start().starts_with('#')).count(), 3);
        assert!(text.contains("FAULT"));
        assert!(text.contains("[min]"));
    }

    #[test]
    fn marks_missing_and_stale_samples() {
        let mut status = snapshot();
        status.orientation_stale = true;
        assert!(render_status(&status).contains("(stale)"));

        status.orientation = None;
        status.tilt = None;
        assert!(render_status(&status).contains("orientation: no sample"));
    }
}
