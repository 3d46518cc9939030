#[macro_use]
extern crate clap;

use {
    anyhow::{bail, Context, Result},
    clap::ArgMatches,
    log::{error, info},
    rep_period::{
        observations::ObservationTable,
        parameters::Parameters,
        ranking::{output_path, rank, read_table, write_table},
        scan::scan,
        windrose,
    },
    simplelog::{Config as LogConfig, LevelFilter, TermLogger, TerminalMode},
    std::{
        fs::{create_dir_all, File},
        io::BufWriter,
    },
};

#[quit::main]
fn main() {
    let matches = clap_app!(rep_period =>
        (version: crate_version!())
        (@arg PARAMETERS: -p --parameters +takes_value +required "Path to file containing search parameters.")
        (@subcommand scan =>
            (about: "Scores every candidate window against the reference period and writes the ranked table.")
        )
        (@subcommand windrose =>
            (about: "Writes the windrose comparison of a ranked window with the reference period.")
            (@arg RANK: -r --rank +takes_value "Row of the ranked table, 0 being the best window (default 0).")
        )
    )
    .get_matches();

    TermLogger::init(LevelFilter::Info, LogConfig::default(), TerminalMode::Mixed)
        .expect("Failed to initialize logger");

    let params = {
        // Should never panic as clap should return an error if the argument was not supplied
        let path = matches
            .value_of("PARAMETERS")
            .expect("Path to parameters file not supplied");

        let file = File::open(path).unwrap_or_else(|e| {
            error!("Failed to open {}: \"{}\"", path, e);
            quit::with_code(1);
        });

        let params = serde_yaml::from_reader::<_, Parameters>(file).unwrap_or_else(|e| {
            error!("Failed to parse parameters from {}: \"{}\"", path, e);
            quit::with_code(1);
        });

        info!(
            "Successfully loaded search parameters from \"{}\": \n{:#?}",
            path, params
        );

        params
    };

    run_subcommand(matches.subcommand(), params).unwrap_or_else(|e| {
        error!("Error: \"{:#}\"", e);
        quit::with_code(1);
    });
}

fn run_subcommand(subcmd: (&str, Option<&ArgMatches>), params: Parameters) -> Result<()> {
    let (subcmd, sub_matches) = match subcmd {
        ("", _) => bail!("No subcommand selected"),
        s => s,
    };

    let plan = params.validate()?;
    let delimiter = params.input.delimiter_byte()?;
    let table_path = output_path(&params.output.directory, &params.output.name, &plan);

    info!("Starting {}", subcmd);

    match subcmd {
        "scan" => {
            let table =
                ObservationTable::from_path(&params.input.wind_file, delimiter, params.input.speed_max)?;

            let rows = rank(scan(&table, &plan));

            create_dir_all(&params.output.directory)?;
            let file = File::create(&table_path)
                .with_context(|| format!("Failed to create {}", table_path.display()))?;
            write_table(BufWriter::new(file), &rows, params.output.shape_columns)?;

            info!("Wrote {} windows to {}", rows.len(), table_path.display());
        }
        "windrose" => {
            let position = match sub_matches.and_then(|m| m.value_of("RANK")) {
                Some(s) => s
                    .parse::<usize>()
                    .with_context(|| format!("Invalid rank \"{}\"", s))?,
                None => 0,
            };

            let windows = read_table(
                File::open(&table_path)
                    .with_context(|| format!("Failed to open {}, run scan first", table_path.display()))?,
            )?;

            let window = match windows.get(position) {
                Some(w) => w,
                None => bail!(
                    "Rank {} requested but {} holds {} windows",
                    position,
                    table_path.display(),
                    windows.len()
                ),
            };

            let table = ObservationTable::from_path(
                &params.input.wind_file,
                delimiter,
                params.windrose.speed_max,
            )?;

            let cells = windrose::compare(&table, plan.reference_start, plan.reference_end, window);

            create_dir_all(&params.output.directory)?;
            let path = params
                .output
                .directory
                .join(windrose::file_name(&params.output.name, position));
            let file = File::create(&path)
                .with_context(|| format!("Failed to create {}", path.display()))?;
            windrose::write_cells(BufWriter::new(file), &cells)?;

            info!("Wrote windrose comparison to {}", path.display());
        }
        _ => {
            // Should be unreachable due to clap catching this error
            bail!("Unrecognized subcommand");
        }
    }

    info!("Finished {}", subcmd);

    Ok(())
}
