// src/parser.rs
use log::{debug, warn};
use serde_json::{Map, Number, Value};
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::Path;
use swc_common::{sync::Lrc, FileName, SourceMap, SourceMapper, Spanned};
use swc_ecma_ast::*;
use swc_ecma_parser::{lexer::Lexer, Parser as SwcParser, StringInput, Syntax, TsConfig};
use swc_ecma_visit::{Visit, VisitWith};

use crate::error::{Result, RouteError};
use crate::model::{RenderSpec, RouteNode, RouteTable};

/// ルート配列がどこに書かれていたか
enum RouteSource {
    /// `routes: [ ... ]` のように直接書かれた配列リテラル
    Inline(ArrayLit),
    /// `routes: routes` / `{ routes }` のような変数参照
    Variable(String),
}

/// AST をトラバースしてルート定義を抽出するための Visitor
struct RouteVisitor {
    /// スニペット取得用
    cm: Lrc<SourceMap>,
    /// 変数名とその配列リテラルのマッピング
    arrays: HashMap<String, ArrayLit>,
    /// 変数名とそのオブジェクトリテラルのマッピング
    objects: HashMap<String, ObjectLit>,
    /// createRouter / new VueRouter / export default で見つかったルート配列
    sources: Vec<RouteSource>,
}

impl RouteVisitor {
    fn new(cm: Lrc<SourceMap>) -> Self {
        RouteVisitor {
            cm,
            arrays: HashMap::new(),
            objects: HashMap::new(),
            sources: Vec::new(),
        }
    }

    /// 式のソース文字列をそのまま返す
    fn snippet(&self, expr: &Expr) -> String {
        self.cm.span_to_snippet(expr.span()).unwrap_or_default()
    }

    /// ルーターのオプションオブジェクト (`{ history, routes }`) から routes を探す
    fn routes_from_options(&self, options: &Expr) -> Option<RouteSource> {
        let obj = match unwrap_expr(options) {
            Expr::Object(obj) => obj,
            Expr::Ident(ident) => self.objects.get(&*ident.sym)?,
            _ => return None,
        };

        for prop in &obj.props {
            let PropOrSpread::Prop(prop) = prop else {
                continue;
            };
            match &**prop {
                Prop::Shorthand(ident) if &*ident.sym == "routes" => {
                    return Some(RouteSource::Variable(ident.sym.to_string()));
                }
                Prop::KeyValue(KeyValueProp { key, value }) if prop_key(key).as_deref() == Some("routes") => {
                    return match unwrap_expr(value) {
                        Expr::Array(arr) => Some(RouteSource::Inline(arr.clone())),
                        Expr::Ident(ident) => Some(RouteSource::Variable(ident.sym.to_string())),
                        other => {
                            warn!("routes が配列でも変数でもありません: {}", self.snippet(other));
                            None
                        }
                    };
                }
                _ => {}
            }
        }
        None
    }

    /// 見つかったルート配列をすべて RouteNode に変換する
    fn into_routes(mut self) -> Result<Vec<RouteNode>> {
        let mut sources = std::mem::take(&mut self.sources);
        if sources.is_empty() && self.arrays.contains_key("routes") {
            debug!("ルーター呼び出しが無いため変数 'routes' を使用");
            sources.push(RouteSource::Variable("routes".to_string()));
        }

        let mut routes = Vec::new();
        let mut resolving = Vec::new();
        let mut seen_variables: Vec<&str> = Vec::new();
        for source in &sources {
            match source {
                RouteSource::Inline(arr) => routes.extend(self.resolve_array(arr, &mut resolving)?),
                // `export default routes` と `createRouter({ routes })` が同じファイルにある場合は 1 回だけ
                RouteSource::Variable(name) if seen_variables.contains(&name.as_str()) => {}
                RouteSource::Variable(name) => {
                    seen_variables.push(name);
                    routes.extend(self.resolve_variable(name, &mut resolving)?);
                }
            }
        }
        Ok(routes)
    }

    /// 変数名から配列を引いて展開する。`resolving` は循環参照の検出用
    fn resolve_variable(&self, name: &str, resolving: &mut Vec<String>) -> Result<Vec<RouteNode>> {
        if resolving.iter().any(|n| n == name) {
            warn!("変数 '{}' が自分自身を参照しています。スキップします", name);
            return Ok(Vec::new());
        }
        let Some(arr) = self.arrays.get(name) else {
            debug!("変数 '{}' の配列定義が見つかりません", name);
            return Ok(Vec::new());
        };

        resolving.push(name.to_string());
        let routes = self.resolve_array(arr, resolving);
        resolving.pop();
        routes
    }

    /// 配列リテラル内のルートオブジェクトを順に変換する (スプレッドも展開)
    fn resolve_array(&self, arr: &ArrayLit, resolving: &mut Vec<String>) -> Result<Vec<RouteNode>> {
        let mut routes = Vec::new();

        for elem in arr.elems.iter().flatten() {
            let expr = unwrap_expr(&elem.expr);
            if elem.spread.is_some() {
                match expr {
                    Expr::Ident(ident) => routes.extend(self.resolve_variable(&ident.sym, resolving)?),
                    other => warn!("展開できないスプレッド要素: {}", self.snippet(other)),
                }
                continue;
            }
            match expr {
                Expr::Object(obj) => routes.push(self.parse_route_object(obj, resolving)?),
                Expr::Ident(ident) => match self.objects.get(&*ident.sym) {
                    Some(obj) => routes.push(self.parse_route_object(obj, resolving)?),
                    None => warn!("ルートオブジェクト '{}' の定義が見つかりません", ident.sym),
                },
                other => warn!("ルートオブジェクトではない要素をスキップ: {}", self.snippet(other)),
            }
        }
        Ok(routes)
    }

    /// ObjectLit (例: `{ path: "home", component: HomeView }`) を受け取り
    /// RouteNode を構築して返す
    fn parse_route_object(&self, obj_lit: &ObjectLit, resolving: &mut Vec<String>) -> Result<RouteNode> {
        let mut path = String::new();
        let mut component: Option<String> = None;
        let mut components: Option<BTreeMap<String, String>> = None;
        let mut redirect: Option<Value> = None;
        let mut children = Vec::new();
        let mut extra = Map::new();

        for prop in &obj_lit.props {
            let PropOrSpread::Prop(prop) = prop else {
                debug!("ルートオブジェクト内のスプレッドは無視します");
                continue;
            };
            match &**prop {
                Prop::KeyValue(KeyValueProp { key, value }) => {
                    let Some(key_name) = prop_key(key) else {
                        continue;
                    };
                    let value = unwrap_expr(value);
                    match key_name.as_str() {
                        "path" => {
                            path = string_literal(value).unwrap_or_else(|| self.snippet(value));
                        }
                        "component" => component = Some(self.snippet(value)),
                        "components" => match value {
                            Expr::Object(views) => components = Some(self.named_views(views)),
                            Expr::Ident(ident) if self.objects.contains_key(&*ident.sym) => {
                                components = Some(self.named_views(&self.objects[&*ident.sym]));
                            }
                            other => warn!("components がオブジェクトではありません: {}", self.snippet(other)),
                        },
                        "redirect" => {
                            let target = string_literal(value).unwrap_or_else(|| self.snippet(value));
                            redirect = Some(Value::String(target));
                        }
                        "children" => match value {
                            Expr::Array(arr) => children = self.resolve_array(arr, resolving)?,
                            Expr::Ident(ident) => children = self.resolve_variable(&ident.sym, resolving)?,
                            other => warn!("children が配列ではありません: {}", self.snippet(other)),
                        },
                        _ => {
                            let v = literal_value(value).unwrap_or_else(|| Value::String(self.snippet(value)));
                            extra.insert(key_name, v);
                        }
                    }
                }
                Prop::Shorthand(ident) => {
                    let name = ident.sym.to_string();
                    match name.as_str() {
                        "path" => path = name.clone(),
                        "component" => component = Some(name.clone()),
                        "components" => match self.objects.get(&*ident.sym) {
                            Some(views) => components = Some(self.named_views(views)),
                            None => warn!("components '{}' の定義が見つかりません", name),
                        },
                        "redirect" => redirect = Some(Value::String(name.clone())),
                        "children" => children = self.resolve_variable(&name, resolving)?,
                        _ => {
                            extra.insert(name.clone(), Value::String(name));
                        }
                    }
                }
                // beforeEnter(to) { ... } のようなメソッド定義
                Prop::Method(MethodProp { key, .. }) => {
                    if let Some(key_name) = prop_key(key) {
                        let text = self.cm.span_to_snippet(prop.span()).unwrap_or_default();
                        extra.insert(key_name, Value::String(text));
                    }
                }
                _ => {}
            }
        }

        let render = RenderSpec::from_parts(&path, component, components, redirect)?;
        Ok(RouteNode {
            path,
            render,
            children,
            extra,
        })
    }

    /// `components: { default: Main, sidebar: Side }` を名前 → ソース文字列に変換
    fn named_views(&self, obj: &ObjectLit) -> BTreeMap<String, String> {
        let mut views = BTreeMap::new();
        for prop in &obj.props {
            let PropOrSpread::Prop(prop) = prop else {
                continue;
            };
            match &**prop {
                Prop::KeyValue(KeyValueProp { key, value }) => {
                    if let Some(name) = prop_key(key) {
                        views.insert(name, self.snippet(unwrap_expr(value)));
                    }
                }
                Prop::Shorthand(ident) => {
                    views.insert(ident.sym.to_string(), ident.sym.to_string());
                }
                _ => {}
            }
        }
        views
    }
}

impl Visit for RouteVisitor {
    /// 変数宣言をキャッチして、配列リテラルとオブジェクトリテラルを記録する
    fn visit_var_decl(&mut self, var_decl: &VarDecl) {
        for declarator in &var_decl.decls {
            let Pat::Ident(BindingIdent { id, .. }) = &declarator.name else {
                continue;
            };
            let Some(init) = &declarator.init else {
                continue;
            };
            let var_name = id.sym.to_string();
            match unwrap_expr(init) {
                Expr::Array(arr) => {
                    debug!("配列変数発見: {} ({} 要素)", var_name, arr.elems.len());
                    self.arrays.insert(var_name, arr.clone());
                }
                Expr::Object(obj) => {
                    self.objects.insert(var_name, obj.clone());
                }
                _ => {}
            }
        }

        // 子ノードも訪問
        var_decl.visit_children_with(self);
    }

    /// createRouter({ routes })
    fn visit_call_expr(&mut self, call: &CallExpr) {
        if let Callee::Expr(callee) = &call.callee {
            if let Expr::Ident(ident) = unwrap_expr(callee) {
                if &*ident.sym == "createRouter" {
                    debug!("createRouter の呼び出し発見");
                    if let Some(source) = call.args.first().and_then(|arg| self.routes_from_options(&arg.expr)) {
                        self.sources.push(source);
                    }
                }
            }
        }
        call.visit_children_with(self);
    }

    /// new VueRouter({ routes }) / new Router({ routes })
    fn visit_new_expr(&mut self, new: &NewExpr) {
        if let Expr::Ident(ident) = unwrap_expr(&new.callee) {
            if matches!(&*ident.sym, "VueRouter" | "Router") {
                debug!("new {} の呼び出し発見", ident.sym);
                let first = new.args.as_ref().and_then(|args| args.first());
                if let Some(source) = first.and_then(|arg| self.routes_from_options(&arg.expr)) {
                    self.sources.push(source);
                }
            }
        }
        new.visit_children_with(self);
    }

    /// export default [ ... ] / export default routes
    fn visit_export_default_expr(&mut self, export: &ExportDefaultExpr) {
        match unwrap_expr(&export.expr) {
            Expr::Array(arr) => self.sources.push(RouteSource::Inline(arr.clone())),
            Expr::Ident(ident) => self.sources.push(RouteSource::Variable(ident.sym.to_string())),
            _ => {}
        }
        export.visit_children_with(self);
    }
}

/// `(...)`, `... as T`, `<T>...`, `... as const` を取り除く
fn unwrap_expr(expr: &Expr) -> &Expr {
    match expr {
        Expr::Paren(ParenExpr { expr, .. })
        | Expr::TsAs(TsAsExpr { expr, .. })
        | Expr::TsTypeAssertion(TsTypeAssertion { expr, .. })
        | Expr::TsConstAssertion(TsConstAssertion { expr, .. }) => unwrap_expr(expr),
        other => other,
    }
}

fn prop_key(key: &PropName) -> Option<String> {
    match key {
        PropName::Ident(ident) => Some(ident.sym.to_string()),
        PropName::Str(s) => Some(s.value.to_string()),
        _ => None,
    }
}

/// 文字列リテラル、または置換を含まないテンプレートリテラル
fn string_literal(expr: &Expr) -> Option<String> {
    match expr {
        Expr::Lit(Lit::Str(s)) => Some(s.value.to_string()),
        Expr::Tpl(tpl) if tpl.exprs.is_empty() => {
            let quasi = tpl.quasis.first()?;
            Some(quasi.cooked.as_ref().unwrap_or(&quasi.raw).to_string())
        }
        _ => None,
    }
}

/// リテラルだけで構成された式を JSON 値に変換する (meta: { requiresAuth: true } など)
fn literal_value(expr: &Expr) -> Option<Value> {
    if let Some(s) = string_literal(expr) {
        return Some(Value::String(s));
    }
    match expr {
        Expr::Lit(Lit::Bool(b)) => Some(Value::Bool(b.value)),
        Expr::Lit(Lit::Null(_)) => Some(Value::Null),
        Expr::Lit(Lit::Num(n)) => {
            if n.value.fract() == 0.0 && n.value.abs() < i64::MAX as f64 {
                Some(Value::Number(Number::from(n.value as i64)))
            } else {
                Number::from_f64(n.value).map(Value::Number)
            }
        }
        Expr::Array(arr) => {
            let mut items = Vec::with_capacity(arr.elems.len());
            for elem in &arr.elems {
                let elem = elem.as_ref()?;
                if elem.spread.is_some() {
                    return None;
                }
                items.push(literal_value(unwrap_expr(&elem.expr))?);
            }
            Some(Value::Array(items))
        }
        Expr::Object(obj) => {
            let mut map = Map::new();
            for prop in &obj.props {
                let PropOrSpread::Prop(prop) = prop else {
                    return None;
                };
                let Prop::KeyValue(KeyValueProp { key, value }) = &**prop else {
                    return None;
                };
                map.insert(prop_key(key)?, literal_value(unwrap_expr(value))?);
            }
            Some(Value::Object(map))
        }
        _ => None,
    }
}

/// ソース文字列からルート定義を抽出する
///
/// `file_path` はエラーメッセージとソースマップ上のファイル名にのみ使う。
pub fn parse_routes_source(file_path: &Path, src: String) -> Result<Vec<RouteNode>> {
    let cm: Lrc<SourceMap> = Default::default();
    let fm = cm.new_source_file(FileName::Real(file_path.to_path_buf()), src);

    // TypeScript構文でパースする設定 (素の JS もこれで読める)
    let syntax = Syntax::Typescript(TsConfig {
        tsx: false,
        decorators: true,
        dts: false,
        no_early_errors: true,
        disallow_ambiguous_jsx_like: true,
    });

    let lexer = Lexer::new(
        syntax,
        Default::default(), // es version
        StringInput::from(&*fm),
        None,
    );

    let mut parser = SwcParser::new_from(lexer);

    let module = parser.parse_module().map_err(|e| RouteError::Parse {
        file: file_path.to_path_buf(),
        message: format!("{:?}", e.kind()),
    })?;

    let mut visitor = RouteVisitor::new(cm.clone());
    visitor.visit_module(&module);

    debug!(
        "{}: 配列変数 {} 個, ルート配列 {} 個",
        file_path.display(),
        visitor.arrays.len(),
        visitor.sources.len()
    );

    visitor.into_routes().map_err(|e| e.in_file(file_path))
}

pub fn parse_routes_in_file(file_path: &Path) -> Result<Vec<RouteNode>> {
    debug!("ファイル解析開始: {}", file_path.display());
    let src = fs::read_to_string(file_path).map_err(|e| RouteError::from(e).in_file(file_path))?;
    parse_routes_source(file_path, src)
}

/// ファイルを解析して RouteTable にまとめる
pub fn parse_route_table(file_path: &Path) -> Result<RouteTable> {
    Ok(RouteTable {
        source_file: file_path.to_path_buf(),
        routes: parse_routes_in_file(file_path)?,
    })
}
