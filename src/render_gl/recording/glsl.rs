use crate::render_gl::ShaderStage;

const VERTEX_BUILTINS: [&str; 2] = ["gl_Position", "gl_PointSize"];
const FRAGMENT_BUILTINS: [&str; 5] = [
    "gl_FragColor",
    "gl_FragData",
    "gl_FragCoord",
    "gl_FrontFacing",
    "gl_PointCoord",
];
const SHARED_BUILTINS: [&str; 10] = [
    "gl_DepthRange",
    "gl_DepthRangeParameters",
    "gl_MaxVertexAttribs",
    "gl_MaxVertexUniformVectors",
    "gl_MaxVaryingVectors",
    "gl_MaxVertexTextureImageUnits",
    "gl_MaxCombinedTextureImageUnits",
    "gl_MaxTextureImageUnits",
    "gl_MaxFragmentUniformVectors",
    "gl_MaxDrawBuffers",
];
const PRECISIONS: [&str; 3] = ["lowp", "mediump", "highp"];

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Ident(String, usize),
    Punct(char, usize),
}

impl Token {
    fn line(&self) -> usize {
        match self {
            Token::Ident(_, line) | Token::Punct(_, line) => *line,
        }
    }

    fn ident(&self) -> Option<&str> {
        match self {
            Token::Ident(name, _) => Some(name),
            Token::Punct(..) => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Qualifier {
    Attribute,
    Uniform,
    Varying,
}

impl Qualifier {
    fn parse(word: &str) -> Option<Qualifier> {
        match word {
            "attribute" => Some(Qualifier::Attribute),
            "uniform" => Some(Qualifier::Uniform),
            "varying" => Some(Qualifier::Varying),
            _ => None,
        }
    }
}

/// Interface of one compiled stage. Attribute and uniform lists hold only
/// names that are used past their declaration, in declaration order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(super) struct StageInterface {
    pub attributes: Vec<String>,
    pub uniforms: Vec<String>,
    pub varyings: Vec<String>,
}

fn tokenize(source: &str) -> Vec<Token> {
    let mut tokens = vec![];
    let mut line = 1;
    let mut chars = source.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '\n' => line += 1,
            '#' => {
                // preprocessor directive
                while let Some(&next) = chars.peek() {
                    if next == '\n' {
                        break;
                    }
                    chars.next();
                }
            }
            '/' if chars.peek() == Some(&'/') => {
                while let Some(&next) = chars.peek() {
                    if next == '\n' {
                        break;
                    }
                    chars.next();
                }
            }
            '/' if chars.peek() == Some(&'*') => {
                chars.next();
                let mut prev = ' ';
                while let Some(next) = chars.next() {
                    if next == '\n' {
                        line += 1;
                    }
                    if prev == '*' && next == '/' {
                        break;
                    }
                    prev = next;
                }
            }
            c if c.is_ascii_alphabetic() || c == '_' => {
                let mut word = c.to_string();
                while let Some(&next) = chars.peek() {
                    if next.is_ascii_alphanumeric() || next == '_' {
                        word.push(next);
                        chars.next();
                    } else {
                        break;
                    }
                }
                tokens.push(Token::Ident(word, line));
            }
            c if c.is_ascii_digit() || c == '.' => {
                while let Some(&next) = chars.peek() {
                    if next.is_ascii_alphanumeric() || next == '.' {
                        chars.next();
                    } else {
                        break;
                    }
                }
            }
            c if c.is_whitespace() => {}
            c => tokens.push(Token::Punct(c, line)),
        }
    }
    tokens
}

fn check_balance(tokens: &[Token]) -> Result<(), String> {
    let mut open: Vec<(char, usize)> = vec![];
    for token in tokens {
        if let Token::Punct(c, line) = token {
            match c {
                '{' | '(' | '[' => open.push((*c, *line)),
                '}' | ')' | ']' => {
                    let expected = match c {
                        '}' => '{',
                        ')' => '(',
                        _ => '[',
                    };
                    match open.pop() {
                        Some((o, _)) if o == expected => {}
                        _ => return Err(format!("ERROR: 0:{}: '{}' : syntax error", line, c)),
                    }
                }
                _ => {}
            }
        }
    }
    match open.pop() {
        Some((c, line)) => Err(format!(
            "ERROR: 0:{}: '{}' : syntax error: unexpected end of file",
            line, c
        )),
        None => Ok(()),
    }
}

fn check_builtins(stage: ShaderStage, tokens: &[Token]) -> Result<(), String> {
    for token in tokens {
        if let Token::Ident(name, line) = token {
            if !name.starts_with("gl_") {
                continue;
            }
            let name = name.as_str();
            let known = SHARED_BUILTINS.contains(&name)
                || match stage {
                    ShaderStage::Vertex => VERTEX_BUILTINS.contains(&name),
                    ShaderStage::Fragment => FRAGMENT_BUILTINS.contains(&name),
                };
            if !known {
                return Err(format!(
                    "ERROR: 0:{}: '{}' : undeclared identifier",
                    line, name
                ));
            }
        }
    }
    Ok(())
}

// Names in `<precision>* <type> <name>[...], <name>[...], ... ;`, or `None`
// when the tokens do not form a declaration.
fn declared_names(tokens: &[Token]) -> Option<Vec<&str>> {
    let mut rest = tokens
        .iter()
        .skip_while(|t| t.ident().map_or(false, |w| PRECISIONS.contains(&w)));
    rest.next()?.ident()?;

    let mut names = vec![];
    loop {
        names.push(rest.next()?.ident()?);
        let mut depth = 0usize;
        loop {
            match rest.next()? {
                Token::Punct('[', _) => depth += 1,
                Token::Punct(']', _) if depth > 0 => depth -= 1,
                Token::Punct(',', _) if depth == 0 => break,
                Token::Punct(';', _) if depth == 0 => return Some(names),
                _ if depth > 0 => {}
                _ => return None,
            }
        }
    }
}

fn has_entry_point(tokens: &[Token]) -> bool {
    tokens.windows(3).any(|w| {
        w[0].ident() == Some("void")
            && w[1].ident() == Some("main")
            && w[2] == Token::Punct('(', w[2].line())
    })
}

/// Compiles one stage, returning its interface or an info log.
pub(super) fn compile(stage: ShaderStage, source: &str) -> Result<StageInterface, String> {
    let tokens = tokenize(source);
    let last_line = tokens.last().map_or(1, Token::line);

    check_balance(&tokens)?;
    check_builtins(stage, &tokens)?;

    let mut declarations: Vec<(Qualifier, String)> = vec![];
    for (i, token) in tokens.iter().enumerate() {
        let qualifier = match token.ident().and_then(Qualifier::parse) {
            Some(qualifier) => qualifier,
            None => continue,
        };
        if qualifier == Qualifier::Attribute && stage == ShaderStage::Fragment {
            return Err(format!(
                "ERROR: 0:{}: 'attribute' : supported in vertex shaders only",
                token.line()
            ));
        }

        match declared_names(&tokens[i + 1..]) {
            Some(names) => {
                declarations.extend(names.into_iter().map(|name| (qualifier, name.to_string())))
            }
            None => {
                return Err(format!(
                    "ERROR: 0:{}: '{}' : syntax error",
                    token.line(),
                    token.ident().unwrap_or_default()
                ))
            }
        }
    }

    if !has_entry_point(&tokens) {
        return Err(format!(
            "ERROR: 0:{}: 'main' : function not defined",
            last_line
        ));
    }

    let uses = |name: &str| tokens.iter().filter(|t| t.ident() == Some(name)).count();

    let mut interface = StageInterface::default();
    for (qualifier, name) in declarations {
        match qualifier {
            Qualifier::Attribute if uses(&name) > 1 => interface.attributes.push(name),
            Qualifier::Uniform if uses(&name) > 1 => interface.uniforms.push(name),
            Qualifier::Varying => interface.varyings.push(name),
            _ => {}
        }
    }
    Ok(interface)
}

#[cfg(test)]
mod tests {
    use super::*;

    const VERT: &str = "
        attribute vec4 aVertexPosition;
        uniform mat4 uModelViewMatrix;
        uniform mat4 uProjectionMatrix;

        void main() {
            gl_Position = uProjectionMatrix * uModelViewMatrix * aVertexPosition;
        }
    ";

    #[test]
    fn reports_used_declarations() {
        let interface = compile(ShaderStage::Vertex, VERT).unwrap();
        assert_eq!(interface.attributes, vec!["aVertexPosition"]);
        assert_eq!(
            interface.uniforms,
            vec!["uModelViewMatrix", "uProjectionMatrix"]
        );
    }

    #[test]
    fn declaration_lists_declare_every_name() {
        let source = "
            attribute vec4 aVertexPosition;
            uniform mat4 uModelViewMatrix, uProjectionMatrix;
            void main() {
                gl_Position = uProjectionMatrix * uModelViewMatrix * aVertexPosition;
            }
        ";
        let interface = compile(ShaderStage::Vertex, source).unwrap();
        assert_eq!(
            interface.uniforms,
            vec!["uModelViewMatrix", "uProjectionMatrix"]
        );
    }

    #[test]
    fn array_declarations_are_scanned_past_the_size() {
        let source = "uniform vec4 uColors[2], uTint; void main() { gl_FragColor = uColors[1] * uTint; }";
        let interface = compile(ShaderStage::Fragment, source).unwrap();
        assert_eq!(interface.uniforms, vec!["uColors", "uTint"]);
    }

    #[test]
    fn declaration_without_terminator_is_a_syntax_error() {
        let source = "uniform mat4 uM void main() { gl_FragColor = vec4(1.0); }";
        let log = compile(ShaderStage::Fragment, source).unwrap_err();
        assert!(log.contains("'uniform' : syntax error"), "{}", log);
    }

    #[test]
    fn depth_range_is_visible_in_both_stages() {
        let vertex = "attribute vec4 aVertexPosition; void main() { gl_Position = gl_DepthRange.far * aVertexPosition; }";
        assert!(compile(ShaderStage::Vertex, vertex).is_ok());

        let fragment = "void main() { gl_FragColor = vec4(gl_DepthRange.near); }";
        assert!(compile(ShaderStage::Fragment, fragment).is_ok());
    }

    #[test]
    fn implementation_limits_are_builtin_constants() {
        let source = "void main() { gl_FragColor = vec4(float(gl_MaxDrawBuffers + gl_MaxVertexAttribs)); }";
        assert!(compile(ShaderStage::Fragment, source).is_ok());
    }

    #[test]
    fn unused_uniform_is_inactive() {
        let source = "uniform mat4 uUnused; void main() { gl_FragColor = vec4(1.0); }";
        let interface = compile(ShaderStage::Fragment, source).unwrap();
        assert!(interface.uniforms.is_empty());
    }

    #[test]
    fn misspelled_builtin_is_undeclared() {
        let source = VERT.replace("gl_Position", "gl_Postion");
        let log = compile(ShaderStage::Vertex, &source).unwrap_err();
        assert!(log.contains("'gl_Postion' : undeclared identifier"), "{}", log);
        assert!(log.starts_with("ERROR: 0:7:"), "{}", log);
    }

    #[test]
    fn fragment_output_is_not_a_vertex_builtin() {
        let source = "void main() { gl_FragColor = vec4(1.0); }";
        assert!(compile(ShaderStage::Vertex, source).is_err());
    }

    #[test]
    fn missing_main_is_rejected() {
        let source = "attribute vec4 a; void mian() { gl_Position = a; }";
        let log = compile(ShaderStage::Vertex, source).unwrap_err();
        assert!(log.contains("'main' : function not defined"));
    }

    #[test]
    fn unbalanced_braces_are_rejected() {
        let source = "void main() { gl_FragColor = vec4(1.0);";
        let log = compile(ShaderStage::Fragment, source).unwrap_err();
        assert!(log.contains("syntax error"));
    }

    #[test]
    fn attribute_in_fragment_is_rejected() {
        let source = "attribute vec4 a; void main() { gl_FragColor = a; }";
        assert!(compile(ShaderStage::Fragment, source).is_err());
    }

    #[test]
    fn comments_and_directives_are_skipped() {
        let source = "#version 100\n// gl_Bogus\n/* gl_Other\n */ void main() { gl_FragColor = vec4(0.5); }";
        assert!(compile(ShaderStage::Fragment, source).is_ok());
    }

    #[test]
    fn precision_qualifier_is_skipped() {
        let source = "varying mediump vec4 vColor; void main() { gl_FragColor = vColor; }";
        let interface = compile(ShaderStage::Fragment, source).unwrap();
        assert_eq!(interface.varyings, vec!["vColor"]);
    }
}
