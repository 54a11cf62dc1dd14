use std::path::PathBuf;

use argh::FromArgs;
use sfmprep::{Preparation, PrepareConfig, UndistortSelection};
use sfmprep_colmap::{CameraModelId, ColmapCli};

#[derive(FromArgs, Debug)]
/// Reconstruct a scene with COLMAP and prepare its images for novel view synthesis.
struct Args {
    /// directory containing an `images` directory; receives every output
    #[argh(positional)]
    data_dir: PathBuf,

    /// camera model estimated during feature extraction
    #[argh(option, default = "CameraModelId::OpenCV")]
    camera_model: CameraModelId,

    /// the colmap executable, defaults to $SFMPREP_COLMAP_BIN or `colmap`
    #[argh(option, default = "sfmprep::config::default_colmap_bin()")]
    colmap_bin: PathBuf,

    /// load the reconstructions of an existing `sparse` directory
    #[argh(switch)]
    reuse_sparse: bool,

    /// undistort each reconstruction with its own registered images
    #[argh(switch)]
    undistort_own_images: bool,
}

/// Rewrite `--long_name` and `--long_name=value` to the dashed spelling argh expects.
fn normalize_args(args: impl IntoIterator<Item = String>) -> Vec<String> {
    let mut out = Vec::new();
    let mut args = args.into_iter();
    while let Some(arg) = args.next() {
        if arg == "--" {
            out.push(arg);
            out.extend(args.by_ref());
            break;
        }
        match arg.strip_prefix("--") {
            Some(long) => match long.split_once('=') {
                Some((name, value)) => {
                    out.push(format!("--{}", name.replace('_', "-")));
                    out.push(value.to_string());
                }
                None => out.push(format!("--{}", long.replace('_', "-"))),
            },
            None => out.push(arg),
        }
    }
    out
}

fn parse_args(cmd: &str, args: Vec<String>) -> Result<Args, argh::EarlyExit> {
    let args = normalize_args(args);
    let args: Vec<&str> = args.iter().map(String::as_str).collect();
    Args::from_args(&[cmd], &args)
}

fn args_from_env() -> Args {
    let mut env_args = std::env::args();
    let arg0 = env_args.next().unwrap_or_default();
    let cmd = std::path::Path::new(&arg0)
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or("sfmprep");

    match parse_args(cmd, env_args.collect()) {
        Ok(args) => args,
        Err(exit) => match exit.status {
            Ok(()) => {
                println!("{}", exit.output);
                std::process::exit(0)
            }
            Err(()) => {
                eprintln!("{}\nRun {} --help for more information.", exit.output, cmd);
                std::process::exit(1)
            }
        },
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let env = env_logger::Env::default().default_filter_or("info");
    env_logger::init_from_env(env);

    let args = args_from_env();

    let config = PrepareConfig {
        camera_model: args.camera_model,
        colmap_bin: args.colmap_bin,
        reuse_sparse: args.reuse_sparse,
        undistort_selection: if args.undistort_own_images {
            UndistortSelection::Own
        } else {
            UndistortSelection::Selected
        },
        ..PrepareConfig::new(args.data_dir)
    };
    log::debug!("Config: {}", serde_json::to_string(&config)?);

    let engine = ColmapCli::new(&config.colmap_bin);
    log::debug!("Using colmap executable {}", engine.executable().display());
    let summary = Preparation::new(config, engine).run().inspect_err(|e| {
        let mut message = e.to_string();
        let mut source = std::error::Error::source(e);
        while let Some(cause) = source {
            message.push_str(&format!(": {cause}"));
            source = cause.source();
        }
        log::error!("{message}");
    })?;

    log::info!(
        "Prepared {} images from reconstruction {} of {}, exported {} points to {}",
        summary.num_images,
        summary.selected,
        summary.num_reconstructions,
        summary.num_points,
        summary.point_cloud_path.display()
    );

    Ok(())
}
