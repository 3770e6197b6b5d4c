use crate::CLAP_STYLING;
use clap::{arg, command};

pub(crate) fn command_argument_builder() -> clap::Command {
    let database_arg = || {
        arg!(-d --"database" <PATH>)
            .required(false)
            .help("Directory holding the mindloom database")
            .default_value("~/.config/mindloom/")
    };

    clap::Command::new("mindloom")
        .version(env!("CARGO_PKG_VERSION"))
        .bin_name("mindloom")
        .styles(CLAP_STYLING)
        .arg(arg!(-q --"quiet" "Suppress banner and non-essential output").required(false))
        .subcommand_required(false)
        .subcommand(
            command!("init")
                .about("Initializes the mindloom database on your filesystem")
                .arg(
                    arg!([PATH])
                        .required(false)
                        .help("Location to store the mindloom database")
                        .default_value("~/.config/mindloom/"),
                )
                .arg(
                    arg!(-f - -"force")
                        .help(
                            "Forces the overwriting of any existing database at the specified \
                        location.",
                        )
                        .required(false),
                ),
        )
        .subcommand(
            command!("map")
                .about("Manage stored mind maps")
                .subcommand(
                    command!("create")
                        .about("Creates a new empty mind map")
                        .arg(
                            arg!(-t --"title" <TITLE>)
                                .required(true)
                                .help("The title of the mind map"),
                        )
                        .arg(database_arg()),
                )
                .subcommand(
                    command!("list")
                        .about("Lists all mind maps, most recently updated first")
                        .arg(database_arg()),
                )
                .subcommand(
                    command!("rename")
                        .about("Renames a mind map")
                        .arg(
                            arg!(-m --"map" <ID>)
                                .required(true)
                                .help("The mind map to rename"),
                        )
                        .arg(
                            arg!(-t --"title" <TITLE>)
                                .required(true)
                                .help("The new title"),
                        )
                        .arg(database_arg()),
                )
                .subcommand(
                    command!("remove")
                        .about("Deletes a mind map and all of its contents")
                        .arg(
                            arg!(-m --"map" <ID>)
                                .required(true)
                                .help("The mind map to delete"),
                        )
                        .arg(database_arg()),
                )
                .subcommand(
                    command!("set-prompt")
                        .about("Sets or clears the per-map system prompt used for generation")
                        .arg(
                            arg!(-m --"map" <ID>)
                                .required(true)
                                .help("The mind map to configure"),
                        )
                        .arg(
                            arg!(-p --"prompt" <PROMPT>)
                                .required(false)
                                .help("The system prompt; omit to revert to the default"),
                        )
                        .arg(database_arg()),
                ),
        )
        .subcommand(
            command!("topic")
                .about("Creates a new root node and generates an explanation of the topic")
                .arg(
                    arg!(-m --"map" <ID>)
                        .required(true)
                        .help("The mind map to add the node to"),
                )
                .arg(arg!(<TOPIC>).required(true).help("The topic to explain"))
                .arg(database_arg()),
        )
        .subcommand(
            command!("expand")
                .about(
                    "Expands a selected span of a node's content into a generated child \
                node, recording the span as a highlight.",
                )
                .arg(
                    arg!(-m --"map" <ID>)
                        .required(true)
                        .help("The mind map to work in"),
                )
                .arg(
                    arg!(-n --"node" <NODE_ID>)
                        .required(true)
                        .help("The node whose content contains the selection"),
                )
                .arg(
                    arg!(-t --"text" <SELECTION>)
                        .required(true)
                        .help("The selected text to expand"),
                )
                .arg(
                    arg!(-p --"prompt" <PROMPT>)
                        .required(false)
                        .help("Custom question to ask about the selection"),
                )
                .arg(database_arg()),
        )
        .subcommand(
            command!("delete")
                .about("Deletes a node and its whole subtree")
                .arg(
                    arg!(-m --"map" <ID>)
                        .required(true)
                        .help("The mind map to work in"),
                )
                .arg(
                    arg!(-n --"node" <NODE_ID>)
                        .required(true)
                        .help("The node to delete"),
                )
                .arg(database_arg()),
        )
        .subcommand(
            command!("connect")
                .about("Adds a manual visual connector between two nodes")
                .arg(
                    arg!(-m --"map" <ID>)
                        .required(true)
                        .help("The mind map to work in"),
                )
                .arg(
                    arg!(-s --"source" <NODE_ID>)
                        .required(true)
                        .help("The source node"),
                )
                .arg(
                    arg!(-t --"target" <NODE_ID>)
                        .required(true)
                        .help("The target node"),
                )
                .arg(database_arg()),
        )
        .subcommand(
            command!("arrange")
                .about("Recomputes every node position from the tree structure")
                .arg(
                    arg!(-m --"map" <ID>)
                        .required(true)
                        .help("The mind map to arrange"),
                )
                .arg(database_arg()),
        )
        .subcommand(
            command!("show")
                .about("Renders a mind map as an outline")
                .arg(
                    arg!(-m --"map" <ID>)
                        .required(true)
                        .help("The mind map to render"),
                )
                .arg(
                    arg!(-f --"format" <FORMAT>)
                        .required(false)
                        .help("Outline format: text, json")
                        .value_parser(["text", "json"])
                        .default_value("text"),
                )
                .arg(database_arg()),
        )
}
