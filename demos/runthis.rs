use argtools::{add_argument, build_arg_parser, group, CommandLineParser, EnvDefault};

#[allow(dead_code)]
mod shared;

fn main() {
    let parser = build_arg_parser(
        CommandLineParser::new("runthis")
            .about("An example implementation of argtools that uses shared arguments."),
        argtools::fragments![
            shared::opt1(),
            shared::optgroup1(),
            add_argument("--custom_arg").default(1),
            group(
                "my custom argument group",
                argtools::fragments![add_argument("--a"), add_argument("--b")],
            ),
            shared::opt2().required(true),
            add_argument("--fenv").env(EnvDefault::new().prefix("MYVAR_")),
            // This option would require that the variable is defined in the environment.
            // add_argument("--fenv2").env(EnvDefault::new().required(true)),
            add_argument("--metavar1").metavar("customvarname1"),
            add_argument("--metavar2")
                .env(EnvDefault::new().prefix("MYVAR_"))
                .metavar("customvarname2"),
        ],
    )
    .expect("Invalid argument parser configuration");

    let namespace = parser.parse();
    println!("hello world from runthis! {namespace}");
}
