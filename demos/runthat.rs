use argtools::{add_argument, build_arg_parser, CommandLineParser};

#[allow(dead_code)]
mod shared;

fn main() {
    let parser = build_arg_parser(
        CommandLineParser::new("runthat")
            .about("An example implementation of argtools that uses shared arguments."),
        argtools::fragments![
            shared::opt1(),
            shared::optgroup1(),
            add_argument("--custom_arg").default(99999),
        ],
    )
    .expect("Invalid argument parser configuration");

    let namespace = parser.parse();
    println!("hello world from runthat! {namespace}");
}
