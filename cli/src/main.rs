#[macro_use]
extern crate clap;

use clap::Arg;

#[derive(Debug)]
enum Error {
    Io(std::io::Error),
    Json(serde_json::Error),
    Templates(ratedecoder_templates::TemplatesError),
}

fn main() -> Result<(), Error> {
    tracing_subscriber::fmt::init();

    let matches = app_from_crate!()
        .arg(
            Arg::with_name("PROGRAM")
                .help("Sets the program-version JSON file to decode")
                .required(true)
                .index(1),
        )
        .arg(
            Arg::with_name("templates")
                .short("t")
                .long("templates")
                .takes_value(true)
                .value_name("TEMPLATES")
                .help("Sets a template YAML file to use instead of the bundled defaults"),
        )
        .get_matches();

    let templates = match matches.value_of("templates") {
        Some(path) => {
            ratedecoder_templates::TemplateSet::load_path(path).map_err(Error::Templates)?
        }
        None => ratedecoder_templates::TemplateSet::default_bundled(),
    };

    let program_path = matches.value_of("PROGRAM").unwrap();
    let program_text = std::fs::read_to_string(program_path).map_err(Error::Io)?;
    let mut program: ratedecoder::ProgramVersion = serde_json::from_str(&program_text).map_err(Error::Json)?;

    ratedecoder::decode_program(&mut program, &templates);

    for algorithm in &program.algorithms {
        println!("# {}", algorithm.description);
        for node in algorithm_nodes(algorithm) {
            println!("  [{:>4}] {}", node.step, node.english);
        }
    }

    Ok(())
}

/// Flatten an already-decoded algorithm's instructions back into the same
/// node order `decode_algorithm` produces, reading the `ast` each
/// instruction now carries rather than re-decoding anything.
fn algorithm_nodes(algorithm: &ratedecoder::Algorithm) -> Vec<&ratedecoder::Node> {
    let mut nodes: Vec<&ratedecoder::Node> =
        algorithm.steps.iter().filter_map(|i| i.ast.as_ref()).flatten().collect();
    for dep in &algorithm.dependency_vars {
        nodes.extend(dependency_nodes(dep));
    }
    nodes
}

fn dependency_nodes(dependency: &ratedecoder::Dependency) -> Vec<&ratedecoder::Node> {
    if !dependency.is_calculated_variable() {
        return Vec::new();
    }
    let mut nodes: Vec<&ratedecoder::Node> =
        dependency.steps.iter().filter_map(|i| i.ast.as_ref()).flatten().collect();
    for nested in &dependency.dependency_vars {
        nodes.extend(dependency_nodes(nested));
    }
    nodes
}
