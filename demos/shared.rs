use argtools::{add_argument, group, Action, Group, SingleOption};

pub fn opt1() -> SingleOption {
    add_argument("--shared_option1").default(12345)
}

pub fn optgroup1() -> Group {
    group(
        "optgroup1",
        argtools::fragments![
            add_argument("--some_setting").action(Action::StoreTrue),
            add_argument("--another_setting").default(5),
        ],
    )
    .description("a group of options")
}

/// The default is fixed, but programs may adjust any other attribute before applying it.
pub fn opt2() -> SingleOption {
    add_argument("--opt2").default("cannot override this")
}
