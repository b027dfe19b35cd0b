//! 命令行选项注册表与分词器
//!
//! 分词规则：
//! - 以 `-` 开头且等于某个已注册短/长选项的token是选项，其余 `-` 开头的token是非法选项；
//! - 选项的值是其后直到下一个选项（或结尾）之间的所有token；
//! - 同一选项（含别名）重复出现时值列表追加而非覆盖；单值选项取最后一次出现的值。
//!
//! [`tokenize`] 是纯函数，结果 [`ParsedOptions`] 构造后不可变。参数按 `OsString`
//! 处理，非UTF-8的文件名原样保留。

use crate::error::{ConvertResult, usage_error};
use clap::{Arg, ArgAction, Command};
use std::collections::BTreeMap;
use std::ffi::{OsStr, OsString};

/// 应用程序版本信息
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// 选项的语义角色
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum OptionRole {
    Files,
    Directory,
    Destination,
    Cover,
    Tags,
    Playlist,
    Verbose,
    StopOnError,
    Help,
    Version,
}

/// 选项接受的值数量
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueArity {
    /// 布尔开关，不接受值
    Flag,
    /// 恰好一个值
    One,
    /// 一个或多个值
    Many,
}

/// 单个已注册选项
#[derive(Debug, Clone)]
pub struct OptionSpec {
    pub role: OptionRole,
    pub short: Option<char>,
    pub long: &'static str,
    pub short_alias: Option<char>,
    pub long_alias: Option<&'static str>,
    pub arity: ValueArity,
    pub value_name: &'static str,
    pub help: &'static str,
}

impl OptionSpec {
    pub fn new(role: OptionRole, short: Option<char>, long: &'static str) -> Self {
        Self {
            role,
            short,
            long,
            short_alias: None,
            long_alias: None,
            arity: ValueArity::Flag,
            value_name: "",
            help: "",
        }
    }

    pub fn alias(mut self, short: Option<char>, long: &'static str) -> Self {
        self.short_alias = short;
        self.long_alias = Some(long);
        self
    }

    pub fn takes(mut self, arity: ValueArity, value_name: &'static str) -> Self {
        self.arity = arity;
        self.value_name = value_name;
        self
    }

    pub fn help(mut self, help: &'static str) -> Self {
        self.help = help;
        self
    }

    /// 判断token是否为本选项（含别名）
    fn matches(&self, token: &str) -> bool {
        if let Some(long) = token.strip_prefix("--") {
            return long == self.long || self.long_alias == Some(long);
        }
        let Some(short) = token.strip_prefix('-') else {
            return false;
        };
        let mut chars = short.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => self.short == Some(c) || self.short_alias == Some(c),
            _ => false,
        }
    }

    /// 用户可见的选项写法，如 `-o/--output`
    pub fn display_flag(&self) -> String {
        match self.short {
            Some(c) => format!("-{c}/--{}", self.long),
            None => format!("--{}", self.long),
        }
    }

    fn to_clap_arg(&self) -> Arg {
        let mut arg = Arg::new(self.long).long(self.long).help(self.help);
        if let Some(c) = self.short {
            arg = arg.short(c);
        }
        if let Some(c) = self.short_alias {
            arg = arg.visible_short_alias(c);
        }
        if let Some(long) = self.long_alias {
            arg = arg.visible_alias(long);
        }
        match (self.role, self.arity) {
            (OptionRole::Help, _) => arg.action(ArgAction::Help),
            (OptionRole::Version, _) => arg.action(ArgAction::Version),
            (_, ValueArity::Flag) => arg.action(ArgAction::SetTrue),
            (_, ValueArity::One) => arg.value_name(self.value_name).num_args(1),
            (_, ValueArity::Many) => arg
                .value_name(self.value_name)
                .num_args(1..)
                .action(ArgAction::Append),
        }
    }
}

/// 某个程序的全部已注册选项
#[derive(Debug, Clone)]
pub struct OptionRegistry {
    pub program: &'static str,
    pub about: &'static str,
    specs: Vec<OptionSpec>,
}

impl OptionRegistry {
    pub fn new(program: &'static str, about: &'static str, specs: Vec<OptionSpec>) -> Self {
        Self {
            program,
            about,
            specs,
        }
    }

    pub fn spec(&self, role: OptionRole) -> Option<&OptionSpec> {
        self.specs.iter().find(|s| s.role == role)
    }

    /// token对应的已注册选项
    pub fn lookup(&self, token: &str) -> Option<&OptionSpec> {
        if !token.starts_with('-') {
            return None;
        }
        self.specs.iter().find(|spec| spec.matches(token))
    }

    /// 对应的clap命令定义（仅用于渲染帮助与版本）
    pub fn command(&self) -> Command {
        self.specs.iter().fold(
            Command::new(self.program)
                .version(VERSION)
                .about(self.about)
                .disable_help_flag(true)
                .disable_version_flag(true),
            |cmd, spec| cmd.arg(spec.to_clap_arg()),
        )
    }

    pub fn render_help(&self) -> String {
        self.command().render_help().to_string()
    }

    pub fn render_version(&self) -> String {
        self.command().render_version()
    }
}

/// 分词结果：角色 → 值列表
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedOptions {
    values: BTreeMap<OptionRole, Vec<OsString>>,
    last: BTreeMap<OptionRole, Vec<OsString>>,
}

impl ParsedOptions {
    pub fn contains(&self, role: OptionRole) -> bool {
        self.values.contains_key(&role)
    }

    pub fn values(&self, role: OptionRole) -> Option<&[OsString]> {
        self.values.get(&role).map(Vec::as_slice)
    }

    /// 最后一次出现时跟随的值
    pub fn last_occurrence(&self, role: OptionRole) -> Option<&[OsString]> {
        self.last.get(&role).map(Vec::as_slice)
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// 调用方是否请求了帮助或版本
///
/// 在分词之前检查，`-h/--help` 与 `-v/--version` 出现在任何位置都生效，
/// 即使同一命令行中还有非法选项。帮助优先于版本。
pub fn info_request<S: AsRef<OsStr>>(registry: &OptionRegistry, args: &[S]) -> Option<OptionRole> {
    let roles: Vec<OptionRole> = args
        .iter()
        .filter_map(|arg| arg.as_ref().to_str())
        .filter_map(|token| registry.lookup(token))
        .map(|spec| spec.role)
        .collect();
    [OptionRole::Help, OptionRole::Version]
        .into_iter()
        .find(|role| roles.contains(role))
}

/// 把原始参数（不含程序名）切分为 选项 → 值列表
pub fn tokenize<S: AsRef<OsStr>>(registry: &OptionRegistry, args: &[S]) -> ConvertResult<ParsedOptions> {
    let mut values: BTreeMap<OptionRole, Vec<OsString>> = BTreeMap::new();
    let mut last: BTreeMap<OptionRole, Vec<OsString>> = BTreeMap::new();
    let mut current: Option<OptionRole> = None;

    for token in args.iter().map(AsRef::as_ref) {
        // 已注册的选项都是ASCII，非UTF-8的token不可能是合法选项
        let text = token.to_string_lossy();
        if let Some(spec) = registry.lookup(&text) {
            values.entry(spec.role).or_default();
            last.insert(spec.role, Vec::new());
            current = Some(spec.role);
            continue;
        }

        if text.starts_with('-') {
            return Err(usage_error(format!("Invalid option -- '{text}' / 非法选项")));
        }

        match current {
            Some(role) => {
                values.entry(role).or_default().push(token.to_os_string());
                last.entry(role).or_default().push(token.to_os_string());
            }
            None => {
                return Err(usage_error(format!(
                    "Unexpected argument '{text}' / 多余的参数（值必须跟在选项之后）"
                )));
            }
        }
    }

    Ok(ParsedOptions { values, last })
}
