// src/lib.rs
//! ルーター定義ツリーから仮想ルート (パス接頭辞の共有・グルーピングのためだけのノード) を取り除き、
//! 子ルートを親の位置に展開するライブラリ。
//!
//! 入力は JSON のルート配列、または TS/JS のルーター定義ファイル。

pub mod error;
pub mod flatten;
pub mod model;
pub mod parser;
pub mod resolver;

pub use error::{Result, RouteError};
pub use flatten::{apply_prefix, find_virtual, flatten, flatten_with_report, FlattenReport};
pub use model::{RenderSpec, RouteNode, RouteTable};
