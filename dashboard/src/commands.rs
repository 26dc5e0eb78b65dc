//! Commands accepted by the `search` binary.

use shared::ProductId;

pub const HELP: &str = "\
Commands:
  <text>                 search for <text> (blank line browses with filters only)
  /category <name>       toggle a category filter
  /maker <name>          toggle a manufacturer filter
  /makers [term]         list manufacturers matching term (local, max 20)
  /categories            list categories
  /cert <name>           toggle a specific certification filter
  /certified             toggle 'has certifications'
  /carbon                toggle 'has carbon data'
  /clear                 clear all filters
  /page <n>, /next, /prev
  /show <id>             product details
  /lookup <id|sku|code>  product details by any identifier
  /similar <id>          similar products
  /stats                 catalog statistics
  /certs                 certification types
  /health                backend health
  /scan <id> [id ...]    EPD risk scan of the given product ids
  /scan @<file.csv>      EPD risk scan of the ids listed in a CSV file
  /scan-report <n>       show stored scan n
  /scan-export <n> [file] save scan n as CSV (default epd_scan_<n>.csv)
  /help, /quit";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Search(String),
    ToggleCategory(String),
    ToggleManufacturer(String),
    ToggleCertification(String),
    Manufacturers(String),
    Categories,
    ToggleCertifications,
    ToggleCarbonData,
    ClearFilters,
    Page(u32),
    NextPage,
    PreviousPage,
    Show(ProductId),
    Lookup(String),
    Similar(ProductId),
    Stats,
    Certifications,
    Health,
    Scan(Vec<String>),
    ScanFile(String),
    ScanReport(u64),
    ScanExport { scan_id: u64, path: Option<String> },
    Help,
    Quit,
}

/// Parse one input line. Anything not starting with `/` is a search query.
pub fn parse(line: &str) -> Result<Command, String> {
    let line = line.trim();
    let Some(rest) = line.strip_prefix('/') else {
        return Ok(Command::Search(line.to_string()));
    };

    let (name, arg) = match rest.split_once(char::is_whitespace) {
        Some((name, arg)) => (name, arg.trim()),
        None => (rest, ""),
    };

    let required = |what: &str| -> Result<String, String> {
        if arg.is_empty() {
            Err(format!("/{} needs {}", name, what))
        } else {
            Ok(arg.to_string())
        }
    };

    match name {
        "category" | "cat" => required("a category name").map(Command::ToggleCategory),
        "maker" | "mfr" => required("a manufacturer name").map(Command::ToggleManufacturer),
        "makers" => Ok(Command::Manufacturers(arg.to_string())),
        "categories" => Ok(Command::Categories),
        "cert" => required("a certification name").map(Command::ToggleCertification),
        "certified" => Ok(Command::ToggleCertifications),
        "carbon" => Ok(Command::ToggleCarbonData),
        "clear" => Ok(Command::ClearFilters),
        "page" => arg
            .parse()
            .map(Command::Page)
            .map_err(|_| format!("Invalid page number: {:?}", arg)),
        "next" => Ok(Command::NextPage),
        "prev" => Ok(Command::PreviousPage),
        "show" => required("a product id").map(|id| Command::Show(ProductId::from(id.as_str()))),
        "lookup" => required("an identifier").map(Command::Lookup),
        "similar" => required("a product id").map(|id| Command::Similar(ProductId::from(id.as_str()))),
        "stats" => Ok(Command::Stats),
        "certs" => Ok(Command::Certifications),
        "health" => Ok(Command::Health),
        "scan" => {
            let arg = required("product ids or @file.csv")?;
            match arg.strip_prefix('@') {
                Some(file) if !file.trim().is_empty() => Ok(Command::ScanFile(file.trim().to_string())),
                Some(_) => Err("/scan @ needs a file name".to_string()),
                None => Ok(Command::Scan(
                    arg.split(|c: char| c == ',' || c.is_whitespace())
                        .filter(|id| !id.is_empty())
                        .map(str::to_string)
                        .collect(),
                )),
            }
        }
        "scan-report" => scan_id(arg).map(Command::ScanReport),
        "scan-export" => {
            let (id, path) = match arg.split_once(char::is_whitespace) {
                Some((id, path)) => (id, Some(path.trim().to_string())),
                None => (arg, None),
            };
            scan_id(id).map(|scan_id| Command::ScanExport { scan_id, path })
        }
        "help" | "?" => Ok(Command::Help),
        "quit" | "exit" => Ok(Command::Quit),
        other => Err(format!("Unknown command /{}. Type /help.", other)),
    }
}

fn scan_id(arg: &str) -> Result<u64, String> {
    arg.parse().map_err(|_| format!("Invalid scan number: {:?}", arg))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_text_is_search() {
        assert_eq!(parse("  recycled carpet "), Ok(Command::Search("recycled carpet".to_string())));
        assert_eq!(parse(""), Ok(Command::Search(String::new())));
    }

    #[test]
    fn test_filter_commands() {
        assert_eq!(
            parse("/maker Interface Inc"),
            Ok(Command::ToggleManufacturer("Interface Inc".to_string()))
        );
        assert_eq!(parse("/certified"), Ok(Command::ToggleCertifications));
        assert_eq!(parse("/makers"), Ok(Command::Manufacturers(String::new())));
        assert!(parse("/category").is_err());
        assert_eq!(
            parse("/cert Global GreenTag"),
            Ok(Command::ToggleCertification("Global GreenTag".to_string()))
        );
        assert!(parse("/cert").is_err());
    }

    #[test]
    fn test_scan_commands() {
        assert_eq!(
            parse("/scan 42, SKU-7  99"),
            Ok(Command::Scan(vec!["42".to_string(), "SKU-7".to_string(), "99".to_string()]))
        );
        assert_eq!(parse("/scan @ids.csv"), Ok(Command::ScanFile("ids.csv".to_string())));
        assert!(parse("/scan").is_err());
        assert!(parse("/scan @").is_err());
        assert_eq!(parse("/scan-report 12"), Ok(Command::ScanReport(12)));
        assert_eq!(
            parse("/scan-export 12 out/scan.csv"),
            Ok(Command::ScanExport {
                scan_id: 12,
                path: Some("out/scan.csv".to_string())
            })
        );
        assert_eq!(parse("/scan-export 3"), Ok(Command::ScanExport { scan_id: 3, path: None }));
        assert!(parse("/scan-export x").is_err());
    }

    #[test]
    fn test_ids_and_pages() {
        assert_eq!(parse("/show 42"), Ok(Command::Show(ProductId::Number(42))));
        assert_eq!(parse("/page 3"), Ok(Command::Page(3)));
        assert!(parse("/page three").is_err());
        assert!(parse("/bogus").is_err());
    }
}
