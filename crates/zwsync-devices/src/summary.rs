//! Fixed-width node table for diagnostics.
//!
//! ```text
//! Node LastStat Basic Type       Type                     Product Name ...
//! ---- -------- ---------------- ------------------------ ------------ ...
//!   2: alive    RoutingSlave     Binary Power Switch      Smart Switch 6 ...
//! ```

use crate::mdl::basic_type_name;
use crate::node::Node;
use crate::transport::Transport;

const BASIC_WIDTH: usize = 16;
const TYPE_WIDTH: usize = 24;
const PRODUCT_WIDTH: usize = 50;
const NAME_WIDTH: usize = 30;
const LOCATION_WIDTH: usize = 30;

impl Node {
    /// Table header: line 0 is the column titles, anything else a separator.
    pub fn one_line_header(line: u8) -> String {
        if line == 0 {
            format!(
                "Node LastStat {:<BASIC_WIDTH$} {:<TYPE_WIDTH$} {:<PRODUCT_WIDTH$} {:<NAME_WIDTH$} Location",
                "Basic Type", "Type", "Product Name", "Name",
            )
        } else {
            format!(
                "{} {} {} {} {} {} {}",
                "-".repeat(4),
                "-".repeat(8),
                "-".repeat(BASIC_WIDTH),
                "-".repeat(TYPE_WIDTH),
                "-".repeat(PRODUCT_WIDTH),
                "-".repeat(NAME_WIDTH),
                "-".repeat(LOCATION_WIDTH),
            )
        }
    }

    /// One table row for this node. Asks the transport for the basic type.
    ///
    /// Widths are minimums: a longer cell, such as the `constructed` or
    /// `value-changed` status, pushes the rest of the row right instead of
    /// being truncated.
    pub fn one_line_summary(&self, transport: &dyn Transport) -> String {
        let basic = basic_type_name(transport.basic_type(self.endpoint_id()));
        let metadata = self.metadata();
        format!(
            "{:>3}: {:<8} {:<BASIC_WIDTH$} {:<TYPE_WIDTH$} {:<PRODUCT_WIDTH$} {:<NAME_WIDTH$} {}",
            self.endpoint_id(),
            self.status().as_str(),
            basic,
            metadata.node_type,
            metadata.product,
            self.name().unwrap_or_default(),
            metadata.location,
        )
    }
}
