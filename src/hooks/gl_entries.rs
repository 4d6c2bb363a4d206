// GLES entry-point manifest
//
// `shared` entries exist in both GLES 1.x and GLES 2.0+, `legacy` only in
// GLES 1.x, `modern` only in GLES 2.0/3.0. The `virtual_*` groups are the
// getters whose extension answers come from the current context instead of
// the driver. Declaration order is table order, which keeps the GLES1 names
// an ordered subsequence of the full table for the loader's parallel walk.

use std::ffi::c_void;

use crate::ffi::*;

macro_rules! for_each_gl_entry {
    ($callback:ident) => {
        $callback! {
            shared {
                fn glActiveTexture(texture: GLenum);
                fn glBindBuffer(target: GLenum, buffer: GLuint);
                fn glBindTexture(target: GLenum, texture: GLuint);
                fn glBlendFunc(sfactor: GLenum, dfactor: GLenum);
                fn glBufferData(target: GLenum, size: GLsizeiptr, data: *const c_void, usage: GLenum);
                fn glBufferSubData(target: GLenum, offset: GLintptr, size: GLsizeiptr, data: *const c_void);
                fn glClear(mask: GLbitfield);
                fn glClearColor(red: GLfloat, green: GLfloat, blue: GLfloat, alpha: GLfloat);
                fn glClearDepthf(depth: GLfloat);
                fn glClearStencil(s: GLint);
                fn glColorMask(red: GLboolean, green: GLboolean, blue: GLboolean, alpha: GLboolean);
                fn glCompressedTexImage2D(target: GLenum, level: GLint, internalformat: GLenum, width: GLsizei, height: GLsizei, border: GLint, image_size: GLsizei, data: *const c_void);
                fn glCompressedTexSubImage2D(target: GLenum, level: GLint, xoffset: GLint, yoffset: GLint, width: GLsizei, height: GLsizei, format: GLenum, image_size: GLsizei, data: *const c_void);
                fn glCopyTexImage2D(target: GLenum, level: GLint, internalformat: GLenum, x: GLint, y: GLint, width: GLsizei, height: GLsizei, border: GLint);
                fn glCopyTexSubImage2D(target: GLenum, level: GLint, xoffset: GLint, yoffset: GLint, x: GLint, y: GLint, width: GLsizei, height: GLsizei);
                fn glCullFace(mode: GLenum);
                fn glDeleteBuffers(n: GLsizei, buffers: *const GLuint);
                fn glDeleteTextures(n: GLsizei, textures: *const GLuint);
                fn glDepthFunc(func: GLenum);
                fn glDepthMask(flag: GLboolean);
                fn glDepthRangef(n: GLfloat, f: GLfloat);
                fn glDisable(cap: GLenum);
                fn glDrawArrays(mode: GLenum, first: GLint, count: GLsizei);
                fn glDrawElements(mode: GLenum, count: GLsizei, type_: GLenum, indices: *const c_void);
                fn glEnable(cap: GLenum);
                fn glFinish();
                fn glFlush();
                fn glFrontFace(mode: GLenum);
                fn glGenBuffers(n: GLsizei, buffers: *mut GLuint);
                fn glGenTextures(n: GLsizei, textures: *mut GLuint);
                fn glGetBufferParameteriv(target: GLenum, pname: GLenum, params: *mut GLint);
                fn glGetError() -> GLenum;
                fn glGetTexParameterfv(target: GLenum, pname: GLenum, params: *mut GLfloat);
                fn glGetTexParameteriv(target: GLenum, pname: GLenum, params: *mut GLint);
                fn glHint(target: GLenum, mode: GLenum);
                fn glIsBuffer(buffer: GLuint) -> GLboolean;
                fn glIsEnabled(cap: GLenum) -> GLboolean;
                fn glIsTexture(texture: GLuint) -> GLboolean;
                fn glLineWidth(width: GLfloat);
                fn glPixelStorei(pname: GLenum, param: GLint);
                fn glPolygonOffset(factor: GLfloat, units: GLfloat);
                fn glReadPixels(x: GLint, y: GLint, width: GLsizei, height: GLsizei, format: GLenum, type_: GLenum, pixels: *mut c_void);
                fn glSampleCoverage(value: GLfloat, invert: GLboolean);
                fn glScissor(x: GLint, y: GLint, width: GLsizei, height: GLsizei);
                fn glStencilFunc(func: GLenum, ref_: GLint, mask: GLuint);
                fn glStencilMask(mask: GLuint);
                fn glStencilOp(fail: GLenum, zfail: GLenum, zpass: GLenum);
                fn glTexImage2D(target: GLenum, level: GLint, internalformat: GLint, width: GLsizei, height: GLsizei, border: GLint, format: GLenum, type_: GLenum, pixels: *const c_void);
                fn glTexParameterf(target: GLenum, pname: GLenum, param: GLfloat);
                fn glTexParameterfv(target: GLenum, pname: GLenum, params: *const GLfloat);
                fn glTexParameteri(target: GLenum, pname: GLenum, param: GLint);
                fn glTexParameteriv(target: GLenum, pname: GLenum, params: *const GLint);
                fn glTexSubImage2D(target: GLenum, level: GLint, xoffset: GLint, yoffset: GLint, width: GLsizei, height: GLsizei, format: GLenum, type_: GLenum, pixels: *const c_void);
                fn glViewport(x: GLint, y: GLint, width: GLsizei, height: GLsizei);
            }
            legacy {
                fn glAlphaFunc(func: GLenum, ref_: GLfloat);
                fn glAlphaFuncx(func: GLenum, ref_: GLfixed);
                fn glClearColorx(red: GLfixed, green: GLfixed, blue: GLfixed, alpha: GLfixed);
                fn glClearDepthx(depth: GLfixed);
                fn glClientActiveTexture(texture: GLenum);
                fn glClipPlanef(plane: GLenum, equation: *const GLfloat);
                fn glClipPlanex(plane: GLenum, equation: *const GLfixed);
                fn glColor4f(red: GLfloat, green: GLfloat, blue: GLfloat, alpha: GLfloat);
                fn glColor4ub(red: GLubyte, green: GLubyte, blue: GLubyte, alpha: GLubyte);
                fn glColor4x(red: GLfixed, green: GLfixed, blue: GLfixed, alpha: GLfixed);
                fn glColorPointer(size: GLint, type_: GLenum, stride: GLsizei, pointer: *const c_void);
                fn glDepthRangex(n: GLfixed, f: GLfixed);
                fn glDisableClientState(array: GLenum);
                fn glEnableClientState(array: GLenum);
                fn glFogf(pname: GLenum, param: GLfloat);
                fn glFogfv(pname: GLenum, params: *const GLfloat);
                fn glFogx(pname: GLenum, param: GLfixed);
                fn glFogxv(pname: GLenum, param: *const GLfixed);
                fn glFrustumf(l: GLfloat, r: GLfloat, b: GLfloat, t: GLfloat, n: GLfloat, f: GLfloat);
                fn glFrustumx(l: GLfixed, r: GLfixed, b: GLfixed, t: GLfixed, n: GLfixed, f: GLfixed);
                fn glGetClipPlanef(plane: GLenum, equation: *mut GLfloat);
                fn glGetClipPlanex(plane: GLenum, equation: *mut GLfixed);
                fn glGetFixedv(pname: GLenum, params: *mut GLfixed);
                fn glGetLightfv(light: GLenum, pname: GLenum, params: *mut GLfloat);
                fn glGetLightxv(light: GLenum, pname: GLenum, params: *mut GLfixed);
                fn glGetMaterialfv(face: GLenum, pname: GLenum, params: *mut GLfloat);
                fn glGetMaterialxv(face: GLenum, pname: GLenum, params: *mut GLfixed);
                fn glGetPointerv(pname: GLenum, params: *mut *mut c_void);
                fn glGetTexEnvfv(target: GLenum, pname: GLenum, params: *mut GLfloat);
                fn glGetTexEnviv(target: GLenum, pname: GLenum, params: *mut GLint);
                fn glGetTexEnvxv(target: GLenum, pname: GLenum, params: *mut GLfixed);
                fn glGetTexParameterxv(target: GLenum, pname: GLenum, params: *mut GLfixed);
                fn glLightModelf(pname: GLenum, param: GLfloat);
                fn glLightModelfv(pname: GLenum, params: *const GLfloat);
                fn glLightModelx(pname: GLenum, param: GLfixed);
                fn glLightModelxv(pname: GLenum, param: *const GLfixed);
                fn glLightf(light: GLenum, pname: GLenum, param: GLfloat);
                fn glLightfv(light: GLenum, pname: GLenum, params: *const GLfloat);
                fn glLightx(light: GLenum, pname: GLenum, param: GLfixed);
                fn glLightxv(light: GLenum, pname: GLenum, params: *const GLfixed);
                fn glLineWidthx(width: GLfixed);
                fn glLoadIdentity();
                fn glLoadMatrixf(m: *const GLfloat);
                fn glLoadMatrixx(m: *const GLfixed);
                fn glLogicOp(opcode: GLenum);
                fn glMaterialf(face: GLenum, pname: GLenum, param: GLfloat);
                fn glMaterialfv(face: GLenum, pname: GLenum, params: *const GLfloat);
                fn glMaterialx(face: GLenum, pname: GLenum, param: GLfixed);
                fn glMaterialxv(face: GLenum, pname: GLenum, param: *const GLfixed);
                fn glMatrixMode(mode: GLenum);
                fn glMultMatrixf(m: *const GLfloat);
                fn glMultMatrixx(m: *const GLfixed);
                fn glMultiTexCoord4f(target: GLenum, s: GLfloat, t: GLfloat, r: GLfloat, q: GLfloat);
                fn glMultiTexCoord4x(texture: GLenum, s: GLfixed, t: GLfixed, r: GLfixed, q: GLfixed);
                fn glNormal3f(nx: GLfloat, ny: GLfloat, nz: GLfloat);
                fn glNormal3x(nx: GLfixed, ny: GLfixed, nz: GLfixed);
                fn glNormalPointer(type_: GLenum, stride: GLsizei, pointer: *const c_void);
                fn glOrthof(l: GLfloat, r: GLfloat, b: GLfloat, t: GLfloat, n: GLfloat, f: GLfloat);
                fn glOrthox(l: GLfixed, r: GLfixed, b: GLfixed, t: GLfixed, n: GLfixed, f: GLfixed);
                fn glPointParameterf(pname: GLenum, param: GLfloat);
                fn glPointParameterfv(pname: GLenum, params: *const GLfloat);
                fn glPointParameterx(pname: GLenum, param: GLfixed);
                fn glPointParameterxv(pname: GLenum, params: *const GLfixed);
                fn glPointSize(size: GLfloat);
                fn glPointSizex(size: GLfixed);
                fn glPolygonOffsetx(factor: GLfixed, units: GLfixed);
                fn glPopMatrix();
                fn glPushMatrix();
                fn glRotatef(angle: GLfloat, x: GLfloat, y: GLfloat, z: GLfloat);
                fn glRotatex(angle: GLfixed, x: GLfixed, y: GLfixed, z: GLfixed);
                fn glSampleCoveragex(value: GLclampx, invert: GLboolean);
                fn glScalef(x: GLfloat, y: GLfloat, z: GLfloat);
                fn glScalex(x: GLfixed, y: GLfixed, z: GLfixed);
                fn glShadeModel(mode: GLenum);
                fn glTexCoordPointer(size: GLint, type_: GLenum, stride: GLsizei, pointer: *const c_void);
                fn glTexEnvf(target: GLenum, pname: GLenum, param: GLfloat);
                fn glTexEnvfv(target: GLenum, pname: GLenum, params: *const GLfloat);
                fn glTexEnvi(target: GLenum, pname: GLenum, param: GLint);
                fn glTexEnviv(target: GLenum, pname: GLenum, params: *const GLint);
                fn glTexEnvx(target: GLenum, pname: GLenum, param: GLfixed);
                fn glTexEnvxv(target: GLenum, pname: GLenum, params: *const GLfixed);
                fn glTexParameterx(target: GLenum, pname: GLenum, param: GLfixed);
                fn glTexParameterxv(target: GLenum, pname: GLenum, params: *const GLfixed);
                fn glTranslatef(x: GLfloat, y: GLfloat, z: GLfloat);
                fn glTranslatex(x: GLfixed, y: GLfixed, z: GLfixed);
                fn glVertexPointer(size: GLint, type_: GLenum, stride: GLsizei, pointer: *const c_void);
            }
            modern {
                fn glAttachShader(program: GLuint, shader: GLuint);
                fn glBindAttribLocation(program: GLuint, index: GLuint, name: *const GLchar);
                fn glBindFramebuffer(target: GLenum, framebuffer: GLuint);
                fn glBindRenderbuffer(target: GLenum, renderbuffer: GLuint);
                fn glBlendColor(red: GLfloat, green: GLfloat, blue: GLfloat, alpha: GLfloat);
                fn glBlendEquation(mode: GLenum);
                fn glBlendEquationSeparate(mode_rgb: GLenum, mode_alpha: GLenum);
                fn glBlendFuncSeparate(sfactor_rgb: GLenum, dfactor_rgb: GLenum, sfactor_alpha: GLenum, dfactor_alpha: GLenum);
                fn glCheckFramebufferStatus(target: GLenum) -> GLenum;
                fn glCompileShader(shader: GLuint);
                fn glCreateProgram() -> GLuint;
                fn glCreateShader(type_: GLenum) -> GLuint;
                fn glDeleteFramebuffers(n: GLsizei, framebuffers: *const GLuint);
                fn glDeleteProgram(program: GLuint);
                fn glDeleteRenderbuffers(n: GLsizei, renderbuffers: *const GLuint);
                fn glDeleteShader(shader: GLuint);
                fn glDetachShader(program: GLuint, shader: GLuint);
                fn glDisableVertexAttribArray(index: GLuint);
                fn glEnableVertexAttribArray(index: GLuint);
                fn glFramebufferRenderbuffer(target: GLenum, attachment: GLenum, renderbuffertarget: GLenum, renderbuffer: GLuint);
                fn glFramebufferTexture2D(target: GLenum, attachment: GLenum, textarget: GLenum, texture: GLuint, level: GLint);
                fn glGenerateMipmap(target: GLenum);
                fn glGenFramebuffers(n: GLsizei, framebuffers: *mut GLuint);
                fn glGenRenderbuffers(n: GLsizei, renderbuffers: *mut GLuint);
                fn glGetActiveAttrib(program: GLuint, index: GLuint, buf_size: GLsizei, length: *mut GLsizei, size: *mut GLint, type_: *mut GLenum, name: *mut GLchar);
                fn glGetActiveUniform(program: GLuint, index: GLuint, buf_size: GLsizei, length: *mut GLsizei, size: *mut GLint, type_: *mut GLenum, name: *mut GLchar);
                fn glGetAttachedShaders(program: GLuint, max_count: GLsizei, count: *mut GLsizei, shaders: *mut GLuint);
                fn glGetAttribLocation(program: GLuint, name: *const GLchar) -> GLint;
                fn glGetFramebufferAttachmentParameteriv(target: GLenum, attachment: GLenum, pname: GLenum, params: *mut GLint);
                fn glGetProgramiv(program: GLuint, pname: GLenum, params: *mut GLint);
                fn glGetProgramInfoLog(program: GLuint, buf_size: GLsizei, length: *mut GLsizei, info_log: *mut GLchar);
                fn glGetRenderbufferParameteriv(target: GLenum, pname: GLenum, params: *mut GLint);
                fn glGetShaderiv(shader: GLuint, pname: GLenum, params: *mut GLint);
                fn glGetShaderInfoLog(shader: GLuint, buf_size: GLsizei, length: *mut GLsizei, info_log: *mut GLchar);
                fn glGetShaderPrecisionFormat(shadertype: GLenum, precisiontype: GLenum, range: *mut GLint, precision: *mut GLint);
                fn glGetShaderSource(shader: GLuint, buf_size: GLsizei, length: *mut GLsizei, source: *mut GLchar);
                fn glGetUniformfv(program: GLuint, location: GLint, params: *mut GLfloat);
                fn glGetUniformiv(program: GLuint, location: GLint, params: *mut GLint);
                fn glGetUniformLocation(program: GLuint, name: *const GLchar) -> GLint;
                fn glGetVertexAttribfv(index: GLuint, pname: GLenum, params: *mut GLfloat);
                fn glGetVertexAttribiv(index: GLuint, pname: GLenum, params: *mut GLint);
                fn glGetVertexAttribPointerv(index: GLuint, pname: GLenum, pointer: *mut *mut c_void);
                fn glIsFramebuffer(framebuffer: GLuint) -> GLboolean;
                fn glIsProgram(program: GLuint) -> GLboolean;
                fn glIsRenderbuffer(renderbuffer: GLuint) -> GLboolean;
                fn glIsShader(shader: GLuint) -> GLboolean;
                fn glLinkProgram(program: GLuint);
                fn glReleaseShaderCompiler();
                fn glRenderbufferStorage(target: GLenum, internalformat: GLenum, width: GLsizei, height: GLsizei);
                fn glShaderBinary(count: GLsizei, shaders: *const GLuint, binaryformat: GLenum, binary: *const c_void, length: GLsizei);
                fn glShaderSource(shader: GLuint, count: GLsizei, string: *const *const GLchar, length: *const GLint);
                fn glStencilFuncSeparate(face: GLenum, func: GLenum, ref_: GLint, mask: GLuint);
                fn glStencilMaskSeparate(face: GLenum, mask: GLuint);
                fn glStencilOpSeparate(face: GLenum, sfail: GLenum, dpfail: GLenum, dppass: GLenum);
                fn glUniform1f(location: GLint, v0: GLfloat);
                fn glUniform1fv(location: GLint, count: GLsizei, value: *const GLfloat);
                fn glUniform1i(location: GLint, v0: GLint);
                fn glUniform1iv(location: GLint, count: GLsizei, value: *const GLint);
                fn glUniform2f(location: GLint, v0: GLfloat, v1: GLfloat);
                fn glUniform2fv(location: GLint, count: GLsizei, value: *const GLfloat);
                fn glUniform2i(location: GLint, v0: GLint, v1: GLint);
                fn glUniform2iv(location: GLint, count: GLsizei, value: *const GLint);
                fn glUniform3f(location: GLint, v0: GLfloat, v1: GLfloat, v2: GLfloat);
                fn glUniform3fv(location: GLint, count: GLsizei, value: *const GLfloat);
                fn glUniform3i(location: GLint, v0: GLint, v1: GLint, v2: GLint);
                fn glUniform3iv(location: GLint, count: GLsizei, value: *const GLint);
                fn glUniform4f(location: GLint, v0: GLfloat, v1: GLfloat, v2: GLfloat, v3: GLfloat);
                fn glUniform4fv(location: GLint, count: GLsizei, value: *const GLfloat);
                fn glUniform4i(location: GLint, v0: GLint, v1: GLint, v2: GLint, v3: GLint);
                fn glUniform4iv(location: GLint, count: GLsizei, value: *const GLint);
                fn glUniformMatrix2fv(location: GLint, count: GLsizei, transpose: GLboolean, value: *const GLfloat);
                fn glUniformMatrix3fv(location: GLint, count: GLsizei, transpose: GLboolean, value: *const GLfloat);
                fn glUniformMatrix4fv(location: GLint, count: GLsizei, transpose: GLboolean, value: *const GLfloat);
                fn glUseProgram(program: GLuint);
                fn glValidateProgram(program: GLuint);
                fn glVertexAttrib1f(index: GLuint, x: GLfloat);
                fn glVertexAttrib1fv(index: GLuint, v: *const GLfloat);
                fn glVertexAttrib2f(index: GLuint, x: GLfloat, y: GLfloat);
                fn glVertexAttrib2fv(index: GLuint, v: *const GLfloat);
                fn glVertexAttrib3f(index: GLuint, x: GLfloat, y: GLfloat, z: GLfloat);
                fn glVertexAttrib3fv(index: GLuint, v: *const GLfloat);
                fn glVertexAttrib4f(index: GLuint, x: GLfloat, y: GLfloat, z: GLfloat, w: GLfloat);
                fn glVertexAttrib4fv(index: GLuint, v: *const GLfloat);
                fn glVertexAttribPointer(index: GLuint, size: GLint, type_: GLenum, normalized: GLboolean, stride: GLsizei, pointer: *const c_void);
                fn glReadBuffer(src: GLenum);
                fn glDrawRangeElements(mode: GLenum, start: GLuint, end: GLuint, count: GLsizei, type_: GLenum, indices: *const c_void);
                fn glTexImage3D(target: GLenum, level: GLint, internalformat: GLint, width: GLsizei, height: GLsizei, depth: GLsizei, border: GLint, format: GLenum, type_: GLenum, pixels: *const c_void);
                fn glTexSubImage3D(target: GLenum, level: GLint, xoffset: GLint, yoffset: GLint, zoffset: GLint, width: GLsizei, height: GLsizei, depth: GLsizei, format: GLenum, type_: GLenum, pixels: *const c_void);
                fn glCopyTexSubImage3D(target: GLenum, level: GLint, xoffset: GLint, yoffset: GLint, zoffset: GLint, x: GLint, y: GLint, width: GLsizei, height: GLsizei);
                fn glCompressedTexImage3D(target: GLenum, level: GLint, internalformat: GLenum, width: GLsizei, height: GLsizei, depth: GLsizei, border: GLint, image_size: GLsizei, data: *const c_void);
                fn glCompressedTexSubImage3D(target: GLenum, level: GLint, xoffset: GLint, yoffset: GLint, zoffset: GLint, width: GLsizei, height: GLsizei, depth: GLsizei, format: GLenum, image_size: GLsizei, data: *const c_void);
                fn glGenQueries(n: GLsizei, ids: *mut GLuint);
                fn glDeleteQueries(n: GLsizei, ids: *const GLuint);
                fn glIsQuery(id: GLuint) -> GLboolean;
                fn glBeginQuery(target: GLenum, id: GLuint);
                fn glEndQuery(target: GLenum);
                fn glGetQueryiv(target: GLenum, pname: GLenum, params: *mut GLint);
                fn glGetQueryObjectuiv(id: GLuint, pname: GLenum, params: *mut GLuint);
                fn glUnmapBuffer(target: GLenum) -> GLboolean;
                fn glGetBufferPointerv(target: GLenum, pname: GLenum, params: *mut *mut c_void);
                fn glDrawBuffers(n: GLsizei, bufs: *const GLenum);
                fn glUniformMatrix2x3fv(location: GLint, count: GLsizei, transpose: GLboolean, value: *const GLfloat);
                fn glUniformMatrix3x2fv(location: GLint, count: GLsizei, transpose: GLboolean, value: *const GLfloat);
                fn glUniformMatrix2x4fv(location: GLint, count: GLsizei, transpose: GLboolean, value: *const GLfloat);
                fn glUniformMatrix4x2fv(location: GLint, count: GLsizei, transpose: GLboolean, value: *const GLfloat);
                fn glUniformMatrix3x4fv(location: GLint, count: GLsizei, transpose: GLboolean, value: *const GLfloat);
                fn glUniformMatrix4x3fv(location: GLint, count: GLsizei, transpose: GLboolean, value: *const GLfloat);
                fn glBlitFramebuffer(src_x0: GLint, src_y0: GLint, src_x1: GLint, src_y1: GLint, dst_x0: GLint, dst_y0: GLint, dst_x1: GLint, dst_y1: GLint, mask: GLbitfield, filter: GLenum);
                fn glRenderbufferStorageMultisample(target: GLenum, samples: GLsizei, internalformat: GLenum, width: GLsizei, height: GLsizei);
                fn glFramebufferTextureLayer(target: GLenum, attachment: GLenum, texture: GLuint, level: GLint, layer: GLint);
                fn glMapBufferRange(target: GLenum, offset: GLintptr, length: GLsizeiptr, access: GLbitfield) -> *mut c_void;
                fn glFlushMappedBufferRange(target: GLenum, offset: GLintptr, length: GLsizeiptr);
                fn glBindVertexArray(array: GLuint);
                fn glDeleteVertexArrays(n: GLsizei, arrays: *const GLuint);
                fn glGenVertexArrays(n: GLsizei, arrays: *mut GLuint);
                fn glIsVertexArray(array: GLuint) -> GLboolean;
                fn glGetIntegeri_v(target: GLenum, index: GLuint, data: *mut GLint);
                fn glBeginTransformFeedback(primitive_mode: GLenum);
                fn glEndTransformFeedback();
                fn glBindBufferRange(target: GLenum, index: GLuint, buffer: GLuint, offset: GLintptr, size: GLsizeiptr);
                fn glBindBufferBase(target: GLenum, index: GLuint, buffer: GLuint);
                fn glTransformFeedbackVaryings(program: GLuint, count: GLsizei, varyings: *const *const GLchar, buffer_mode: GLenum);
                fn glGetTransformFeedbackVarying(program: GLuint, index: GLuint, buf_size: GLsizei, length: *mut GLsizei, size: *mut GLsizei, type_: *mut GLenum, name: *mut GLchar);
                fn glVertexAttribIPointer(index: GLuint, size: GLint, type_: GLenum, stride: GLsizei, pointer: *const c_void);
                fn glGetVertexAttribIiv(index: GLuint, pname: GLenum, params: *mut GLint);
                fn glGetVertexAttribIuiv(index: GLuint, pname: GLenum, params: *mut GLuint);
                fn glVertexAttribI4i(index: GLuint, x: GLint, y: GLint, z: GLint, w: GLint);
                fn glVertexAttribI4ui(index: GLuint, x: GLuint, y: GLuint, z: GLuint, w: GLuint);
                fn glVertexAttribI4iv(index: GLuint, v: *const GLint);
                fn glVertexAttribI4uiv(index: GLuint, v: *const GLuint);
                fn glGetUniformuiv(program: GLuint, location: GLint, params: *mut GLuint);
                fn glGetFragDataLocation(program: GLuint, name: *const GLchar) -> GLint;
                fn glUniform1ui(location: GLint, v0: GLuint);
                fn glUniform2ui(location: GLint, v0: GLuint, v1: GLuint);
                fn glUniform3ui(location: GLint, v0: GLuint, v1: GLuint, v2: GLuint);
                fn glUniform4ui(location: GLint, v0: GLuint, v1: GLuint, v2: GLuint, v3: GLuint);
                fn glUniform1uiv(location: GLint, count: GLsizei, value: *const GLuint);
                fn glUniform2uiv(location: GLint, count: GLsizei, value: *const GLuint);
                fn glUniform3uiv(location: GLint, count: GLsizei, value: *const GLuint);
                fn glUniform4uiv(location: GLint, count: GLsizei, value: *const GLuint);
                fn glClearBufferiv(buffer: GLenum, drawbuffer: GLint, value: *const GLint);
                fn glClearBufferuiv(buffer: GLenum, drawbuffer: GLint, value: *const GLuint);
                fn glClearBufferfv(buffer: GLenum, drawbuffer: GLint, value: *const GLfloat);
                fn glClearBufferfi(buffer: GLenum, drawbuffer: GLint, depth: GLfloat, stencil: GLint);
                fn glCopyBufferSubData(read_target: GLenum, write_target: GLenum, read_offset: GLintptr, write_offset: GLintptr, size: GLsizeiptr);
                fn glGetUniformIndices(program: GLuint, count: GLsizei, names: *const *const GLchar, indices: *mut GLuint);
                fn glGetActiveUniformsiv(program: GLuint, count: GLsizei, indices: *const GLuint, pname: GLenum, params: *mut GLint);
                fn glGetUniformBlockIndex(program: GLuint, name: *const GLchar) -> GLuint;
                fn glGetActiveUniformBlockiv(program: GLuint, index: GLuint, pname: GLenum, params: *mut GLint);
                fn glGetActiveUniformBlockName(program: GLuint, index: GLuint, buf_size: GLsizei, length: *mut GLsizei, name: *mut GLchar);
                fn glUniformBlockBinding(program: GLuint, index: GLuint, binding: GLuint);
                fn glDrawArraysInstanced(mode: GLenum, first: GLint, count: GLsizei, instancecount: GLsizei);
                fn glDrawElementsInstanced(mode: GLenum, count: GLsizei, type_: GLenum, indices: *const c_void, instancecount: GLsizei);
                fn glFenceSync(condition: GLenum, flags: GLbitfield) -> GLsync;
                fn glIsSync(sync: GLsync) -> GLboolean;
                fn glDeleteSync(sync: GLsync);
                fn glClientWaitSync(sync: GLsync, flags: GLbitfield, timeout: GLuint64) -> GLenum;
                fn glWaitSync(sync: GLsync, flags: GLbitfield, timeout: GLuint64);
                fn glGetSynciv(sync: GLsync, pname: GLenum, count: GLsizei, length: *mut GLsizei, values: *mut GLint);
                fn glGetInteger64i_v(target: GLenum, index: GLuint, data: *mut GLint64);
                fn glGetBufferParameteri64v(target: GLenum, pname: GLenum, params: *mut GLint64);
                fn glGenSamplers(count: GLsizei, samplers: *mut GLuint);
                fn glDeleteSamplers(count: GLsizei, samplers: *const GLuint);
                fn glIsSampler(sampler: GLuint) -> GLboolean;
                fn glBindSampler(unit: GLuint, sampler: GLuint);
                fn glSamplerParameteri(sampler: GLuint, pname: GLenum, param: GLint);
                fn glSamplerParameteriv(sampler: GLuint, pname: GLenum, param: *const GLint);
                fn glSamplerParameterf(sampler: GLuint, pname: GLenum, param: GLfloat);
                fn glSamplerParameterfv(sampler: GLuint, pname: GLenum, param: *const GLfloat);
                fn glGetSamplerParameteriv(sampler: GLuint, pname: GLenum, params: *mut GLint);
                fn glGetSamplerParameterfv(sampler: GLuint, pname: GLenum, params: *mut GLfloat);
                fn glVertexAttribDivisor(index: GLuint, divisor: GLuint);
                fn glBindTransformFeedback(target: GLenum, id: GLuint);
                fn glDeleteTransformFeedbacks(n: GLsizei, ids: *const GLuint);
                fn glGenTransformFeedbacks(n: GLsizei, ids: *mut GLuint);
                fn glIsTransformFeedback(id: GLuint) -> GLboolean;
                fn glPauseTransformFeedback();
                fn glResumeTransformFeedback();
                fn glGetProgramBinary(program: GLuint, buf_size: GLsizei, length: *mut GLsizei, binary_format: *mut GLenum, binary: *mut c_void);
                fn glProgramBinary(program: GLuint, binary_format: GLenum, binary: *const c_void, length: GLsizei);
                fn glProgramParameteri(program: GLuint, pname: GLenum, value: GLint);
                fn glInvalidateFramebuffer(target: GLenum, num_attachments: GLsizei, attachments: *const GLenum);
                fn glInvalidateSubFramebuffer(target: GLenum, num_attachments: GLsizei, attachments: *const GLenum, x: GLint, y: GLint, width: GLsizei, height: GLsizei);
                fn glTexStorage2D(target: GLenum, levels: GLsizei, internalformat: GLenum, width: GLsizei, height: GLsizei);
                fn glTexStorage3D(target: GLenum, levels: GLsizei, internalformat: GLenum, width: GLsizei, height: GLsizei, depth: GLsizei);
                fn glGetInternalformativ(target: GLenum, internalformat: GLenum, pname: GLenum, count: GLsizei, params: *mut GLint);
            }
            virtual_shared {
                fn glGetBooleanv(pname: GLenum, data: *mut GLboolean);
                fn glGetFloatv(pname: GLenum, data: *mut GLfloat);
                fn glGetIntegerv(pname: GLenum, data: *mut GLint);
                fn glGetString(name: GLenum) -> *const GLubyte;
            }
            virtual_modern {
                fn glGetStringi(name: GLenum, index: GLuint) -> *const GLubyte;
                fn glGetInteger64v(pname: GLenum, data: *mut GLint64);
            }
        }
    };
}

pub(crate) use for_each_gl_entry;

macro_rules! gl_table {
    (
        shared { $($shared:tt)* }
        legacy { $($legacy:tt)* }
        modern { $($modern:tt)* }
        virtual_shared { $($virtual_shared:tt)* }
        virtual_modern { $($virtual_modern:tt)* }
    ) => {
        hook_table! {
            /// One GLES implementation; the same layout serves GLES 1.x and 2.0+
            pub struct GlTable {
                $($shared)*
                $($legacy)*
                $($modern)*
                $($virtual_shared)*
                $($virtual_modern)*
            }
        }

        /// Entry points exported by libGLESv1_CM, in table order
        pub const GLES1_NAMES: &[&std::ffi::CStr] = entry_names! {
            $($shared)*
            $($legacy)*
            $($virtual_shared)*
        };
    };
}

for_each_gl_entry!(gl_table);

hook_table! {
    /// GL extension entry points, only reachable through `eglGetProcAddress`
    pub struct GlExtTable {
        fn glGenFramebuffersOES(n: GLsizei, framebuffers: *mut GLuint);
        fn glBindFramebufferOES(target: GLenum, framebuffer: GLuint);
        fn glFramebufferTexture2DOES(target: GLenum, attachment: GLenum, textarget: GLenum, texture: GLuint, level: GLint);
        fn glDeleteFramebuffersOES(n: GLsizei, framebuffers: *const GLuint);
        fn glCheckFramebufferStatusOES(target: GLenum) -> GLenum;
        fn glEGLImageTargetTexture2DOES(target: GLenum, image: GLeglImageOES);
        fn glEGLImageTargetRenderbufferStorageOES(target: GLenum, image: GLeglImageOES);
    }
}
