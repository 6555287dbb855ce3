use std::path::PathBuf;
use std::process::ExitCode;

use modgraph::modules::builtin::{
    FundtoAdjoint, FundtoAdjointPar, GaugePropAdj, GaugePropAdjPar, LoadNersc, LoadNerscPar,
    MesonAdj, MesonAdjPar, MobiusDWFAdj, MobiusDWFAdjPar, RBPrecCGAdj, RBPrecCGAdjPar,
    ScalarPoint, ScalarPointPar, Z2Adj, Z2AdjPar,
};
use modgraph::{read_parameters_file, Application, ApplicationResult, StopSignal};

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let Some(parameter_file) = std::env::args().nth(1).map(PathBuf::from) else {
        let program = std::env::args().next().unwrap_or_else(|| "modgraph".into());
        eprintln!("usage: {program} <parameter file>");
        return ExitCode::FAILURE;
    };

    let mut app = Application::new();
    if let Err(e) = setup(&mut app, &parameter_file) {
        tracing::error!(error = %e, "setup failed");
        return ExitCode::FAILURE;
    }

    tokio::spawn(watch_interrupts(app.stop_signal()));

    match app.run().await {
        Ok(()) => {
            if let Some(summary) = app.summary() {
                tracing::info!(
                    run_id = %summary.run_id,
                    trajectories = summary.reports.len(),
                    "run completed"
                );
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!(error = %e, "run failed");
            ExitCode::FAILURE
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
enum Interrupt {
    Stop,
    Exit,
}

/// First Ctrl-C stops after the current module, a second one exits at once.
fn on_interrupt(stop: &StopSignal) -> Interrupt {
    if stop.is_triggered() {
        return Interrupt::Exit;
    }
    stop.trigger();
    Interrupt::Stop
}

async fn watch_interrupts(stop: StopSignal) {
    while tokio::signal::ctrl_c().await.is_ok() {
        match on_interrupt(&stop) {
            Interrupt::Stop => {
                tracing::warn!("interrupt received, stopping after the current module")
            }
            Interrupt::Exit => {
                tracing::error!("second interrupt received, exiting");
                std::process::exit(130);
            }
        }
    }
}

fn setup(app: &mut Application, parameter_file: &std::path::Path) -> ApplicationResult<()> {
    let params = read_parameters_file(parameter_file)?;
    app.set_par(params.global)?;

    if params.modules.is_empty() {
        declare_adjoint_meson_chain(app)
    } else {
        app.load_modules(&params.modules)
    }
}

/// Point-to-point adjoint meson measurement on one gauge configuration.
fn declare_adjoint_meson_chain(app: &mut Application) -> ApplicationResult<()> {
    app.create_module::<LoadNersc>(
        "gauge",
        LoadNerscPar {
            file: "./cnfg/ckpoint_lat".into(),
        },
    )?;
    app.create_module::<FundtoAdjoint>(
        "adjgauge",
        FundtoAdjointPar {
            gaugeconf: "gauge".into(),
        },
    )?;
    app.create_module::<Z2Adj>("z2wall", Z2AdjPar { t_a: 0, t_b: 0 })?;
    app.create_module::<ScalarPoint>(
        "sink",
        ScalarPointPar {
            mom: "0 0 0".into(),
        },
    )?;
    app.create_module::<MobiusDWFAdj>(
        "mobiusadj",
        MobiusDWFAdjPar {
            gauge: "adjgauge".into(),
            ls: 8,
            mass: 0.05,
            m5: 1.8,
            b: 1.0,
            c: 0.0,
            boundary: "1 1 1 -1".into(),
            twist: "0. 0. 0. 0.".into(),
        },
    )?;
    app.create_module::<RBPrecCGAdj>(
        "cg",
        RBPrecCGAdjPar {
            action: "mobiusadj".into(),
            residual: 1.0e-8,
            max_iteration: 10000,
        },
    )?;
    app.create_module::<GaugePropAdj>(
        "prop",
        GaugePropAdjPar {
            solver: "cg".into(),
            source: "z2wall".into(),
        },
    )?;
    app.create_module::<MesonAdj>(
        "meson_pt_ll",
        MesonAdjPar {
            output: "mesons/pt_ll".into(),
            q1: "prop".into(),
            q2: "prop".into(),
            gammas: "all".into(),
            sink: "sink".into(),
        },
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_interrupt_exits() {
        let stop = StopSignal::new();
        assert_eq!(on_interrupt(&stop), Interrupt::Stop);
        assert!(stop.is_triggered());
        assert_eq!(on_interrupt(&stop), Interrupt::Exit);
    }
}
