use argtools::{add_subparsers, deferred_arg_parser, CommandLineParser};

#[allow(dead_code)]
mod shared;

fn main() {
    let factory = deferred_arg_parser(
        CommandLineParser::new("subparsers"),
        argtools::fragments![
            shared::opt1(),
            add_subparsers([
                ("optionA", argtools::fragments![shared::opt2()]),
                ("optionB", argtools::fragments![shared::optgroup1()]),
            ])
            .dest("command")
            .about("optionA", "Configure with the second shared option.")
            .about("optionB", "Configure with the shared option group."),
        ],
    )
    .expect("Invalid argument parser configuration");

    let namespace = factory.make().parse();
    println!("hello world from subparser example! {namespace}");
}
