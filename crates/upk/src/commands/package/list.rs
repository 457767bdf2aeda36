use clap::Args;
use itertools::Itertools;
use miette::Result;
use owo_colors::OwoColorize;
use upk_package::PathTreeNode;

use super::PackageArgs;

#[derive(Args)]
pub struct ListArgs {
    #[command(flatten)]
    package: PackageArgs,

    /// Only print directories
    #[arg(long, default_value_t = false)]
    directories: bool,
}

impl ListArgs {
    pub fn handle(&self) -> Result<()> {
        let package = self.package.open()?;
        let tree = package.build_tree()?;

        let mut lines = Vec::new();
        self.render(&tree, 0, &mut lines);
        println!("{}", lines.iter().join("\n"));

        println!(
            "{} assets, {} files, {} bytes",
            package.len(),
            package.file_count(),
            package.total_payload_size().unwrap_or_default()
        );
        Ok(())
    }

    fn render(&self, node: &PathTreeNode, depth: usize, lines: &mut Vec<String>) {
        let indent = "  ".repeat(depth);
        match node {
            PathTreeNode::Directory(_) if node.is_implied() && !node.is_root() => {
                lines.push(format!("{}{}", indent, node.dimmed()))
            }
            PathTreeNode::Directory(_) => lines.push(format!("{}{}", indent, node.blue().bold())),
            PathTreeNode::Leaf(_) if self.directories => return,
            PathTreeNode::Leaf(_) => lines.push(format!("{}{}", indent, node)),
        }

        for child in node.children() {
            self.render(child, depth + 1, lines);
        }
    }
}
