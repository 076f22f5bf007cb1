use ndarray::s;
use std::env;
use std::error::Error;
use xpd_importer::{ChannelKind, XpdReader};

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        eprintln!("Usage: {} <path_to_xpd_file>", args[0]);
        std::process::exit(1);
    }

    // Open and index the file
    let mut reader = XpdReader::open(&args[1])?;
    let (experiment, trial) = xpd_importer::trial_names(std::path::Path::new(&args[1]));
    println!("Experiment {} trial {}", experiment, trial);

    // Print trial header
    println!("\n{}", reader.header());

    // Print channel information
    for kind in ChannelKind::ALL {
        println!("Number of {} channels: {}", kind, reader.index().len(kind));
    }

    let tetrodes = reader.available_tetrodes();
    if tetrodes.is_empty() {
        println!("\nNo tetrodes in this trial.");
        return Ok(());
    }

    println!("\nTetrodes:");
    for id in tetrodes {
        let tetrode = reader.read_tetrode(id)?;
        let bundle = &tetrode.value;
        println!(
            "  Tet::{}: {} samples x {} electrodes at {} kHz ({:.1} ms)",
            bundle.id,
            bundle.num_samples(),
            bundle.samples.ncols(),
            bundle.sample_rate,
            bundle.duration_ms()
        );

        // Show first few samples of each electrode
        let num_samples = std::cmp::min(5, bundle.num_samples());
        if num_samples > 0 {
            let head = bundle.samples.slice(s![..num_samples, ..]);
            for row in head.rows() {
                println!("    {:?} {}", row.to_vec(), bundle.units);
            }
        }

        for warning in &tetrode.warnings {
            println!("    warning: {}", warning);
        }
    }

    reader.close();
    Ok(())
}
