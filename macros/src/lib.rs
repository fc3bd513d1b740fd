use proc_macro::Delimiter;
use proc_macro::Group;
use proc_macro::Ident;
use proc_macro::Literal;
use proc_macro::Punct;
use proc_macro::Spacing;
use proc_macro::Span;
use proc_macro::TokenStream;
use proc_macro::TokenTree;

/// Unrolls the body of a dummy `fn` item a fixed number of times.
///
/// ```ignore
/// #[chacha_stream::loop_unroll(i, 0, 4)]
/// fn loop_unroll() {
///     out[i] = _mm_add_epi32(out[i], v[i]);
/// }
/// ```
///
/// Arguments are `index, start, count[, step]`. Passing `_` as the index
/// repeats the body without binding a counter.
#[proc_macro_attribute]
pub fn loop_unroll(attr: TokenStream, item: TokenStream) -> TokenStream {
    let args = match UnrollArgs::parse(attr) {
        Ok(args) => args,
        Err(msg) => return compile_error(&msg),
    };
    let body = match fn_body(item) {
        Some(body) => body,
        None => return compile_error("loop_unroll expects a `fn` item with a body"),
    };

    let mut output = TokenStream::new();
    let index = args.index.as_ref();

    if let Some(index) = index {
        // let mut <index> = <start>;
        output.extend([
            TokenTree::Ident(Ident::new("let", Span::call_site())),
            TokenTree::Ident(Ident::new("mut", Span::call_site())),
            TokenTree::Ident(index.clone()),
            TokenTree::Punct(Punct::new('=', Spacing::Alone)),
            TokenTree::Literal(args.start.clone()),
            TokenTree::Punct(Punct::new(';', Spacing::Alone)),
        ]);
    }

    for n in 0..args.count {
        output.extend(TokenStream::from(TokenTree::Group(body.clone())));
        // the counter is not bumped after the final copy
        if n + 1 == args.count {
            break;
        }
        if let Some(index) = index {
            // <index> += <step>;
            output.extend([
                TokenTree::Ident(index.clone()),
                TokenTree::Punct(Punct::new('+', Spacing::Joint)),
                TokenTree::Punct(Punct::new('=', Spacing::Alone)),
                TokenTree::Literal(args.step.clone()),
                TokenTree::Punct(Punct::new(';', Spacing::Alone)),
            ]);
        }
    }

    TokenStream::from(TokenTree::Group(Group::new(Delimiter::Brace, output)))
}

struct UnrollArgs {
    index: Option<Ident>,
    start: Literal,
    count: usize,
    step: Literal,
}

impl UnrollArgs {
    fn parse(attr: TokenStream) -> Result<Self, String> {
        // split on commas, one token per argument
        let args: Vec<TokenTree> = attr
            .into_iter()
            .filter(|tt| !matches!(tt, TokenTree::Punct(p) if p.as_char() == ','))
            .collect();

        if args.len() != 3 && args.len() != 4 {
            return Err(format!("loop_unroll expects 3 or 4 arguments, got {}", args.len()));
        }

        let index = match &args[0] {
            TokenTree::Ident(ident) if ident.to_string() == "_" => None,
            TokenTree::Ident(ident) => Some(ident.clone()),
            _ => return Err("first argument must be an identifier or `_`".into()),
        };
        let start = match &args[1] {
            TokenTree::Literal(lit) => lit.clone(),
            _ => return Err("second argument must be an integer literal".into()),
        };
        let count = match &args[2] {
            TokenTree::Literal(lit) => lit
                .to_string()
                .trim_end_matches("usize")
                .parse::<usize>()
                .map_err(|_| "third argument must be an integer literal".to_string())?,
            _ => return Err("third argument must be an integer literal".into()),
        };
        let step = match args.get(3) {
            Some(TokenTree::Literal(lit)) => lit.clone(),
            Some(_) => return Err("fourth argument must be an integer literal".into()),
            None => Literal::usize_unsuffixed(1),
        };

        if count == 0 {
            return Err("loop_unroll count must be at least 1".into());
        }

        Ok(Self { index, start, count, step })
    }
}

fn fn_body(item: TokenStream) -> Option<Group> {
    item.into_iter().find_map(|tt| match tt {
        TokenTree::Group(group) if group.delimiter() == Delimiter::Brace => Some(group),
        _ => None,
    })
}

fn compile_error(msg: &str) -> TokenStream {
    let mut inner = TokenStream::new();
    inner.extend([TokenTree::Literal(Literal::string(msg))]);
    let mut output = TokenStream::new();
    output.extend([
        TokenTree::Ident(Ident::new("compile_error", Span::call_site())),
        TokenTree::Punct(Punct::new('!', Spacing::Alone)),
        TokenTree::Group(Group::new(Delimiter::Parenthesis, inner)),
        TokenTree::Punct(Punct::new(';', Spacing::Alone)),
    ]);
    output
}
