use log::LevelFilter;
use std::io::Read;
use std::process::ExitCode;

// usage: objtool [-v] <input.obj|-> [output.obj] [name]
// reads a mesh, says what's in it, and optionally writes it back out
// with a single index per vertex
fn main() -> ExitCode {
    let mut args = std::env::args().skip(1).collect::<Vec<_>>();
    let verbose = args.first().map(|a| a == "-v").unwrap_or(false);
    if verbose {
        args.remove(0);
    }

    simple_logger::SimpleLogger::new()
        .with_level(if verbose {
            LevelFilter::Info
        } else {
            LevelFilter::Warn
        })
        .init()
        .unwrap();

    let Some(input) = args.first() else {
        eprintln!("usage: objtool [-v] <input.obj|-> [output.obj] [name]");
        return ExitCode::FAILURE;
    };

    let mesh = if input == "-" {
        let mut s = vec![];
        if let Err(e) = std::io::stdin().read_to_end(&mut s) {
            log::error!("couldn't read stdin: {}", e);
            return ExitCode::FAILURE;
        }
        wavefront::MeshReader::read(&s[..])
    } else {
        wavefront::read_mesh(input)
    };
    let mesh = match mesh {
        Ok(mesh) => mesh,
        Err(e) => {
            log::error!("{}: {}", input, e);
            return ExitCode::FAILURE;
        }
    };
    println!("{}: {}", input, mesh.summary());

    if let Some(output) = args.get(1) {
        let name = args.get(2).map(|s| s.as_str());
        if let Err(e) = wavefront::write_mesh(output, &mesh, name) {
            log::error!("{}: {}", output, e);
            return ExitCode::FAILURE;
        }
        log::info!("wrote {}", output);
    }
    ExitCode::SUCCESS
}
