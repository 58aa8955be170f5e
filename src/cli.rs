use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "runzip")]
#[command(version)]
#[command(about = "A Rust unzip utility with HTTP URL support", long_about = None)]
#[command(after_help = "Examples:\n  \
  runzip data1.zip -x joe        extract all files except joe from data1.zip\n  \
  runzip -p foo.zip | more       send contents of foo.zip via pipe into more\n  \
  runzip -t foo.zip              test every entry against its CRC-32\n  \
  runzip -l https://example.com/archive.zip   list files from remote ZIP")]
pub struct Cli {
    /// ZIP file path or HTTP URL
    #[arg(value_name = "FILE")]
    pub file: String,

    /// Files to extract (default: all)
    #[arg(value_name = "FILES")]
    pub files: Vec<String>,

    /// List files (short format)
    #[arg(short = 'l')]
    pub list: bool,

    /// List verbosely/show version info
    #[arg(short = 'v')]
    pub verbose: bool,

    /// Test archive files (decompress and check CRC-32)
    #[arg(short = 't')]
    pub test: bool,

    /// Extract files to pipe, no messages
    #[arg(short = 'p')]
    pub pipe: bool,

    /// Extract files into exdir
    #[arg(short = 'd', value_name = "DIR")]
    pub extract_dir: Option<String>,

    /// Exclude files that follow
    #[arg(short = 'x', value_name = "FILE", num_args = 1..)]
    pub exclude: Vec<String>,

    /// Never overwrite existing files
    #[arg(short = 'n')]
    pub never_overwrite: bool,

    /// Overwrite files WITHOUT prompting
    #[arg(short = 'o')]
    pub overwrite: bool,

    /// Junk paths (do not make directories)
    #[arg(short = 'j')]
    pub junk_paths: bool,

    /// Quiet mode (-qq => quieter)
    #[arg(short = 'q', action = clap::ArgAction::Count)]
    pub quiet: u8,

    /// Window size in bytes used to read the central directory
    #[arg(long = "window-size", value_name = "BYTES", default_value_t = crate::io::DEFAULT_WINDOW_SIZE)]
    pub window_size: usize,
}

impl Cli {
    pub fn is_http_url(&self) -> bool {
        self.file.starts_with("http://") || self.file.starts_with("https://")
    }

    pub fn is_quiet(&self) -> bool {
        self.quiet > 0 || self.pipe
    }

    pub fn is_very_quiet(&self) -> bool {
        self.quiet > 1
    }

    /// Whether an archive member passes the positional and `-x` filters.
    ///
    /// Positional patterns with `*` or `?` are globs over the full name;
    /// plain ones must equal the full name or its last component. Any `-x`
    /// pattern that is a substring or glob match excludes the member.
    pub fn selects(&self, name: &str) -> bool {
        let included = self.files.is_empty()
            || self.files.iter().any(|f| {
                if f.contains(['*', '?']) {
                    glob_match(f, name)
                } else {
                    name == f || name.rsplit('/').next() == Some(f.as_str())
                }
            });
        included
            && !self
                .exclude
                .iter()
                .any(|x| name.contains(x.as_str()) || glob_match(x, name))
    }
}

/// `*` matches any run of characters, `?` exactly one.
pub fn glob_match(pattern: &str, text: &str) -> bool {
    let pattern: Vec<char> = pattern.chars().collect();
    let text: Vec<char> = text.chars().collect();
    let (mut p, mut t) = (0, 0);
    // Position of the last `*` and the text index it is currently absorbing up to.
    let mut star: Option<(usize, usize)> = None;

    while t < text.len() {
        match pattern.get(p) {
            Some('*') => {
                star = Some((p, t));
                p += 1;
            }
            Some(&c) if c == '?' || c == text[t] => {
                p += 1;
                t += 1;
            }
            _ => match star {
                Some((sp, st)) => {
                    p = sp + 1;
                    t = st + 1;
                    star = Some((sp, st + 1));
                }
                None => return false,
            },
        }
    }
    pattern[p..].iter().all(|&c| c == '*')
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_defaults() {
        let cli = Cli::try_parse_from(["runzip", "a.zip"]).unwrap();
        assert_eq!(cli.file, "a.zip");
        assert_eq!(cli.window_size, crate::io::DEFAULT_WINDOW_SIZE);
        assert!(!cli.test && !cli.is_quiet() && !cli.is_http_url());
    }

    #[test]
    fn test_flags() {
        let cli = Cli::try_parse_from([
            "runzip",
            "-t",
            "-qq",
            "--window-size",
            "512",
            "https://example.com/a.zip",
            "docs/*.md",
        ])
        .unwrap();
        assert!(cli.test);
        assert!(cli.is_very_quiet());
        assert_eq!(cli.window_size, 512);
        assert!(cli.is_http_url());
        assert_eq!(cli.files, ["docs/*.md"]);
    }

    #[test]
    fn test_glob_match() {
        assert!(glob_match("*.txt", "readme.txt"));
        assert!(glob_match("file?.dat", "file1.dat"));
        assert!(glob_match("a*b*c", "aXXbYYc"));
        assert!(glob_match("*", ""));
        assert!(!glob_match("*.txt", "readme.md"));
        assert!(!glob_match("?", ""));
        assert!(!glob_match("a*b", "acbx"));
    }

    #[test]
    fn test_selects() {
        let cli = Cli::try_parse_from(["runzip", "a.zip", "readme.md", "src/*.rs", "-x", "test"])
            .unwrap();
        assert!(cli.selects("docs/readme.md"));
        assert!(cli.selects("src/lib.rs"));
        assert!(!cli.selects("src/test_util.rs"));
        assert!(!cli.selects("Cargo.toml"));

        let all = Cli::try_parse_from(["runzip", "a.zip"]).unwrap();
        assert!(all.selects("anything/at/all"));
    }
}
