use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use log::info;
use structopt::StructOpt;

use glquad::bootstrap::Bootstrap;
use glquad::logging::{init_logging, LoggingConfig};
use glquad::quad::ShaderSources;
use glquad::resources::Resources;
use glquad::surface::{GlVersion, HeadlessSurface, SdlSurface, SurfaceConfig};

#[derive(StructOpt, Debug)]
struct CommonOpt {
    #[structopt(default_value = "640", long, help = "drawable width")]
    width: u32,
    #[structopt(default_value = "480", long, help = "drawable height")]
    height: u32,
    #[structopt(
        parse(from_os_str),
        long,
        help = "directory holding quad.vert and quad.frag"
    )]
    shader_dir: Option<PathBuf>,
    #[structopt(long, help = "log filter, e.g. \"glquad=trace\"")]
    log_filter: Option<String>,
}

#[derive(StructOpt, Debug)]
#[structopt(name = "glquad", about = "Draws one quad with OpenGL.")]
enum Glquad {
    #[structopt(about = "open a window and draw one frame")]
    Show {
        #[structopt(flatten)]
        common: CommonOpt,
        #[structopt(default_value = "glquad", long, help = "window title")]
        title: String,
        #[structopt(default_value = "2.1", long, help = "OpenGL context version")]
        gl_version: GlVersion,
        #[structopt(default_value = "4", long, help = "MSAA samples, 0 to disable")]
        samples: u8,
    },
    #[structopt(about = "run the pipeline without a window and print the GL calls")]
    Trace {
        #[structopt(flatten)]
        common: CommonOpt,
    },
}

impl Glquad {
    fn common(&self) -> &CommonOpt {
        match self {
            Glquad::Show { common, .. } | Glquad::Trace { common } => common,
        }
    }
}

fn load_sources(shader_dir: Option<&Path>) -> Result<ShaderSources> {
    match shader_dir {
        Some(dir) => {
            let res = Resources::from_dir(dir);
            info!("loading shaders from {}", res.root_path().display());
            ShaderSources::from_res(&res, "quad").context("shader load error")
        }
        None => ShaderSources::embedded().context("shader load error"),
    }
}

fn main() -> Result<()> {
    let opt = Glquad::from_args();

    init_logging(LoggingConfig {
        env_filter: opt.common().log_filter.clone(),
        ..LoggingConfig::default()
    });

    let sources = load_sources(opt.common().shader_dir.as_deref())?;
    let bootstrap = Bootstrap::new(sources);

    match opt {
        Glquad::Show {
            common,
            title,
            gl_version,
            samples,
        } => {
            let mut surface = SdlSurface::new(SurfaceConfig {
                title,
                width: common.width,
                height: common.height,
                gl_version,
                samples,
            });
            let session = bootstrap.run(&mut surface)?;
            info!("frame presented, waiting for the window to close");
            surface.wait_for_close().map_err(|e| anyhow!(e))?;
            session.release();
        }
        Glquad::Trace { common } => {
            let mut surface = HeadlessSurface::new(common.width, common.height);
            let result = bootstrap.run(&mut surface);
            for call in surface.recorder().calls().iter() {
                println!("{:?}", call);
            }
            result?.release();
        }
    }

    Ok(())
}
